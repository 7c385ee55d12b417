/// Per-frame simulation.
///
/// `tick` takes the previous snapshot by value, runs the frame phases in a
/// fixed order on it and returns the next snapshot.  All randomness comes
/// through the injected `rng`, so a seeded RNG replays a run exactly.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, info};

use crate::attacks::{
    base_attack_a, base_attack_b, base_shape, compose_attack, compose_shape, effective_cooldown,
    nova_burst,
};
use crate::config::Tuning;
use crate::entities::{
    AttackInstance, AttackShape, AttackState, Body, Enemy, EnemyKind, Facing, GameState,
    GameStatus, InputIntent, Player, Projectile, ProjectileOwner, Socket, StatusEffect,
};
use crate::inventory::Inventory;
use crate::mutations::{MutationKind, Tag};
use crate::progression::generate_choices;
use crate::spawn::{
    enemy_profile, pickup_at, player_body, spawn_boss, spawn_pickup, spawn_wave, wave_size,
    IdAllocator, BOSS_SHOT_COOLDOWN, BOSS_SHOT_DAMAGE, BOSS_SHOT_LIFT, BOSS_SHOT_SPEED,
};

// ── Tuning constants ─────────────────────────────────────────────────────────

/// Speed factor when moving on both axes at once.
pub const DIAGONAL_FACTOR: f32 = 0.707;
/// Depth movement is slower than lateral movement.
pub const DEPTH_SCALE: f32 = 0.6;
/// Attacks and contacts only connect within this height difference.
pub const HIT_BAND: f32 = 30.0;
/// Line hitboxes extend this far in depth, centred on the origin.
pub const LINE_DEPTH: f32 = 40.0;
/// Player projectile damage relative to the attack that spawned it.
pub const PROJECTILE_DAMAGE_FACTOR: f32 = 0.7;
pub const POISON_DURATION: f32 = 3.0;
pub const POISON_DPS: f32 = 3.0;
pub const SLOW_DURATION: f32 = 1.5;
pub const SLOW_FACTOR: f32 = 0.6;
/// Contact knockback on the player relative to the enemy profile's value.
pub const CONTACT_KNOCKBACK_SCALE: f32 = 2.5;
pub const PICKUP_RADIUS: f32 = 20.0;
/// Pickups are missed while the player is higher than this.
pub const PICKUP_MAX_HEIGHT: f32 = 20.0;
/// Distances below this are treated as this when normalising directions.
pub const MIN_DISTANCE: f32 = 1e-3;

// ── Constructors ─────────────────────────────────────────────────────────────

pub fn new_player(tuning: &Tuning, ids: &mut IdAllocator) -> Player {
    Player {
        id: ids.next_id(),
        body: player_body(tuning),
        attack_state: None,
        xp: 0,
        level: 1,
        xp_to_next_level: tuning.xp_first_level,
        base_attack_a: base_attack_a(),
        base_attack_b: base_attack_b(),
    }
}

/// Build a fresh run: wave 1 with the opening enemies, empty inventory,
/// clock and id numbering at zero.
pub fn init_state<R: Rng + ?Sized>(tuning: Tuning, rng: &mut R) -> GameState {
    let mut ids = IdAllocator::new();
    let player = new_player(&tuning, &mut ids);
    let enemies = spawn_wave(&tuning, &mut ids, 1, tuning.initial_enemies, 0.0, rng);
    GameState {
        player,
        enemies,
        boss: None,
        projectiles: Vec::new(),
        pickups: Vec::new(),
        attack_instances: Vec::new(),
        inventory: Inventory::with_capacity(tuning.backpack_capacity),
        wave: 1,
        status: GameStatus::Running,
        level_up_choices: Vec::new(),
        clock: 0.0,
        ids,
        tuning,
    }
}

// ── Geometry helpers ─────────────────────────────────────────────────────────

/// Unit vector along `(dx, dy)`, or zero when the points coincide.
pub fn direction(dx: f32, dy: f32) -> (f32, f32) {
    let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
    (dx / dist, dy / dist)
}

fn rects_overlap(ax: f32, ay: f32, aw: f32, ah: f32, bx: f32, by: f32, bw: f32, bh: f32) -> bool {
    ax < bx + bw && ax + aw > bx && ay < by + bh && ay + ah > by
}

fn attack_reaches(attack: &AttackInstance, target: &Body) -> bool {
    if (target.mid_z() - attack.z).abs() > HIT_BAND {
        return false;
    }
    match attack.spec.shape {
        AttackShape::Circle => {
            let dx = target.center_x() - attack.x;
            let dy = target.center_y() - attack.y;
            let reach = attack.spec.area + target.width / 2.0;
            dx * dx + dy * dy < reach * reach
        }
        AttackShape::Line => {
            let left = match attack.facing {
                Facing::Right => attack.x,
                Facing::Left => attack.x - attack.spec.area,
            };
            rects_overlap(
                left,
                attack.y - LINE_DEPTH / 2.0,
                attack.spec.area,
                LINE_DEPTH,
                target.x,
                target.y,
                target.width,
                target.height,
            )
        }
        // Projectile-shaped specs do their damage through `Projectile`s.
        AttackShape::Projectile => false,
    }
}

fn projectile_hits(p: &Projectile, target: &Body) -> bool {
    (target.z - p.z).abs() < target.height
        && rects_overlap(p.x, p.y, p.width, p.height, target.x, target.y, target.width, target.height)
}

// ── Physics ──────────────────────────────────────────────────────────────────

/// Integrate one body: gravity and ground contact, knockback decay, planar
/// motion, then clamp into the arena.
pub fn integrate_body(body: &mut Body, tuning: &Tuning, dt: f32) {
    body.vz += body.stats.gravity * dt;
    body.z += body.vz * dt;
    if body.z <= 0.0 {
        body.z = 0.0;
        body.vz = 0.0;
        body.on_ground = true;
    } else {
        body.on_ground = false;
    }

    let decay = (1.0 - tuning.knockback_friction * dt).max(0.0);
    body.knockback_vx *= decay;
    body.knockback_vy *= decay;
    if body.knockback_vx.abs() < tuning.knockback_snap {
        body.knockback_vx = 0.0;
    }
    if body.knockback_vy.abs() < tuning.knockback_snap {
        body.knockback_vy = 0.0;
    }

    body.x += (body.vx + body.knockback_vx) * dt;
    body.y += (body.vy + body.knockback_vy) * dt;
    body.x = body.x.clamp(0.0, (tuning.arena_width - body.width).max(0.0));
    body.y = body.y.clamp(
        tuning.play_band_min,
        (tuning.play_band_max - body.height).max(tuning.play_band_min),
    );
}

fn face_along(body: &mut Body) {
    if body.vx.abs() > 1.0 {
        body.facing = if body.vx > 0.0 { Facing::Right } else { Facing::Left };
    }
}

// ── Per-frame tick ───────────────────────────────────────────────────────────

/// Advance the simulation by `dt` seconds under `input`.
///
/// Does nothing unless the run is `Running`: a pending level-up or a game
/// over freezes every entity and the clock.
pub fn tick<R: Rng + ?Sized>(
    mut state: GameState,
    input: &InputIntent,
    dt: f32,
    rng: &mut R,
) -> GameState {
    if state.status != GameStatus::Running {
        return state;
    }
    let dt = dt.clamp(0.0, state.tuning.max_frame_dt);
    state.clock += dt;
    let now = state.clock;

    // ── 1. Attack-state expiry ───────────────────────────────────────────────
    if let Some(attack) = &state.player.attack_state {
        if now - attack.started_at > attack.spec.active + attack.spec.recovery {
            state.player.attack_state = None;
        }
    }

    // ── 2. Socket assignment ─────────────────────────────────────────────────
    if input.equip_newest_a {
        state.inventory.equip_newest(Socket::A);
    }
    if input.equip_newest_b {
        state.inventory.equip_newest(Socket::B);
    }

    // ── 3. Shape derivation ──────────────────────────────────────────────────
    state.player.body.shape = compose_shape(&base_shape(), state.inventory.equipped());

    // ── 4. Movement ──────────────────────────────────────────────────────────
    steer_player(&mut state.player.body, input);

    // ── 5. Physics ───────────────────────────────────────────────────────────
    let tuning = state.tuning;
    integrate_body(&mut state.player.body, &tuning, dt);
    for enemy in state.enemies.iter_mut().chain(state.boss.iter_mut()) {
        integrate_body(&mut enemy.body, &tuning, dt);
    }

    // ── 6. Attack triggering ─────────────────────────────────────────────────
    trigger_attacks(&mut state, input, now);

    // ── 7. Attack-instance resolution ────────────────────────────────────────
    resolve_attacks(&mut state, now);

    // ── 8. Projectiles ───────────────────────────────────────────────────────
    update_projectiles(&mut state, dt, now);

    // ── 9. Status effects & enemy AI ─────────────────────────────────────────
    update_enemies(&mut state, dt, now);

    // ── 10. Death & loot ─────────────────────────────────────────────────────
    collect_dead(&mut state, now, rng);

    // ── 11. Level-up check ───────────────────────────────────────────────────
    // A pending choice defers wave progression and pickups to the first
    // frame after it is resolved.
    if state.player.xp >= state.player.xp_to_next_level {
        state.level_up_choices = generate_choices(&state.inventory, rng);
        state.status = GameStatus::ChoicePending;
        info!(
            level = state.player.level,
            xp = state.player.xp,
            options = state.level_up_choices.len(),
            "level-up pending"
        );
    } else {
        // ── 12. Wave progression ─────────────────────────────────────────────
        advance_wave(&mut state, now, rng);

        // ── 13. Pickup collection ────────────────────────────────────────────
        collect_pickups(&mut state);
    }

    // ── 14. Terminal check ───────────────────────────────────────────────────
    if !state.player.body.is_alive() {
        state.status = GameStatus::GameOver;
        state.level_up_choices.clear();
        info!(wave = state.wave, level = state.player.level, "game over");
    }

    state
}

fn steer_player(body: &mut Body, input: &InputIntent) {
    let ax = input.move_x.signum() as f32;
    let ay = input.move_y.signum() as f32;
    let diagonal = if ax != 0.0 && ay != 0.0 { DIAGONAL_FACTOR } else { 1.0 };
    let speed = body.stats.move_speed * diagonal;
    body.vx = ax * speed;
    body.vy = ay * speed * DEPTH_SCALE;
    face_along(body);

    if input.jump && body.on_ground {
        body.vz = body.stats.jump_velocity;
        body.on_ground = false;
    }
}

fn trigger_attacks(state: &mut GameState, input: &InputIntent, now: f32) {
    for socket in [Socket::A, Socket::B] {
        let held = match socket {
            Socket::A => input.attack_a,
            Socket::B => input.attack_b,
        };
        if !held || state.player.attack_state.is_some() {
            continue;
        }

        let spec = compose_attack(
            state.player.base_attack(socket),
            state.inventory.socket(socket),
        );
        let body = &state.player.body;
        let ready = body
            .last_attack(socket)
            .map_or(true, |last| now - last >= effective_cooldown(&spec));
        if !ready {
            continue;
        }

        let origin_x = match (spec.shape, body.facing) {
            (AttackShape::Line, Facing::Right) => body.x + body.width,
            (AttackShape::Line, Facing::Left) => body.x,
            _ => body.center_x(),
        };
        let instance = AttackInstance {
            id: state.ids.next_id(),
            owner_id: state.player.id,
            spec: spec.clone(),
            x: origin_x,
            y: body.center_y(),
            z: body.mid_z(),
            facing: body.facing,
            expires_at: now + spec.active,
            hit_ids: BTreeSet::new(),
            socket: Some(socket),
        };

        if socket == Socket::B {
            if let Some(sub) = spec.projectile {
                let sign = body.facing.sign();
                let projectile = Projectile {
                    id: state.ids.next_id(),
                    owner_id: state.player.id,
                    owner: ProjectileOwner::Player,
                    x: body.center_x() + sign * (body.width / 2.0 + 4.0),
                    y: body.center_y() - 6.0,
                    z: body.mid_z(),
                    vx: sub.speed * sign,
                    vz: 0.0,
                    width: sub.width,
                    height: sub.height,
                    damage: spec.base_damage * PROJECTILE_DAMAGE_FACTOR,
                    pierce: sub.pierce,
                    expires_at: now + sub.lifetime,
                };
                state.projectiles.push(projectile);
            }
        }

        state.attack_instances.push(instance);
        state.player.body.set_last_attack(socket, now);
        state.player.attack_state = Some(AttackState {
            spec,
            started_at: now,
        });
    }
}

fn resolve_attacks(state: &mut GameState, now: f32) {
    state.attack_instances.retain(|attack| now <= attack.expires_at);

    let GameState {
        attack_instances,
        enemies,
        boss,
        inventory,
        player,
        ..
    } = state;
    let (player_x, player_y) = (player.body.x, player.body.y);

    for attack in attack_instances.iter_mut() {
        let card = attack.socket.and_then(|socket| inventory.socket(socket));
        let poisons = card.map_or(false, |c| c.has_tag(Tag::Poison));
        let slows = card.map_or(false, |c| c.has_tag(Tag::Slow));

        for enemy in enemies.iter_mut().chain(boss.iter_mut()) {
            if !enemy.body.is_alive() || attack.hit_ids.contains(&enemy.id) {
                continue;
            }
            if !attack_reaches(attack, &enemy.body) {
                continue;
            }

            attack.hit_ids.insert(enemy.id);
            enemy.body.stats.hp -= attack.spec.base_damage;
            let (nx, ny) = direction(enemy.body.x - player_x, enemy.body.y - player_y);
            enemy.body.knockback_vx += nx * attack.spec.knockback;
            enemy.body.knockback_vy += ny * attack.spec.knockback;

            if poisons {
                enemy.body.refresh_status(StatusEffect::Poison {
                    remaining: POISON_DURATION,
                    dps: POISON_DPS,
                });
            }
            if slows {
                enemy.body.refresh_status(StatusEffect::Slow {
                    remaining: SLOW_DURATION,
                    factor: SLOW_FACTOR,
                });
            }
        }
    }
}

fn update_projectiles(state: &mut GameState, dt: f32, now: f32) {
    let gravity = state.tuning.gravity;
    let GameState {
        projectiles,
        enemies,
        boss,
        player,
        ..
    } = state;

    projectiles.retain_mut(|p| {
        p.x += p.vx * dt;
        p.vz += gravity * dt;
        p.z = (p.z + p.vz * dt).max(0.0);
        if now > p.expires_at {
            return false;
        }

        match p.owner {
            ProjectileOwner::Player => {
                let target = enemies
                    .iter_mut()
                    .chain(boss.iter_mut())
                    .find(|e| e.body.is_alive() && projectile_hits(p, &e.body));
                match target {
                    Some(enemy) => {
                        enemy.body.stats.hp -= p.damage;
                        false
                    }
                    None => true,
                }
            }
            ProjectileOwner::Enemy => {
                if projectile_hits(p, &player.body) {
                    player.body.stats.hp -= p.damage;
                    false
                } else {
                    true
                }
            }
        }
    });
}

/// Tick status effects down, apply poison, and return the slow multiplier.
fn tick_status_effects(body: &mut Body, dt: f32) -> f32 {
    let mut speed_factor: f32 = 1.0;
    let mut poison_damage = 0.0;
    body.status_effects.retain_mut(|effect| {
        match effect {
            StatusEffect::Poison { remaining, dps } => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    return false;
                }
                poison_damage += *dps * dt;
            }
            StatusEffect::Slow { remaining, factor } => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    return false;
                }
                speed_factor = speed_factor.min(*factor);
            }
        }
        true
    });
    body.stats.hp -= poison_damage;
    speed_factor
}

fn update_enemies(state: &mut GameState, dt: f32, now: f32) {
    let GameState {
        enemies,
        boss,
        player,
        projectiles,
        ids,
        ..
    } = state;

    for enemy in enemies.iter_mut() {
        if !enemy.body.is_alive() {
            continue;
        }
        let speed_factor = tick_status_effects(&mut enemy.body, dt);
        chase_player(enemy, player, speed_factor, now);
    }

    if let Some(boss) = boss.as_mut() {
        if boss.body.is_alive() {
            let speed_factor = tick_status_effects(&mut boss.body, dt);
            if let Some(shot) = boss_behaviour(boss, player, speed_factor, now, ids) {
                projectiles.push(shot);
            }
        }
    }
}

fn chase_player(enemy: &mut Enemy, player: &mut Player, speed_factor: f32, now: f32) {
    let profile = enemy_profile(enemy.kind);
    let dx = player.body.x - enemy.body.x;
    let dy = player.body.y - enemy.body.y;
    let dist = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = direction(dx, dy);
    let speed = enemy.body.stats.move_speed * speed_factor;

    let retreat = profile.retreat_below.map_or(false, |limit| dist < limit);
    if retreat {
        enemy.body.vx = -nx * speed;
        enemy.body.vy = -ny * speed * DEPTH_SCALE;
    } else if dist > profile.stand_off {
        enemy.body.vx = nx * speed;
        enemy.body.vy = ny * speed * DEPTH_SCALE;
    } else {
        enemy.body.vx = 0.0;
        enemy.body.vy = 0.0;
    }
    face_along(&mut enemy.body);

    let contact_ready = enemy
        .last_contact
        .map_or(true, |last| now - last > profile.melee_cooldown);
    if dist < profile.melee_radius
        && (player.body.z - enemy.body.z).abs() < HIT_BAND
        && contact_ready
    {
        enemy.last_contact = Some(now);
        player.body.stats.hp -= profile.contact_damage;
        let push = profile.contact_knockback * CONTACT_KNOCKBACK_SCALE;
        player.body.knockback_vx += nx * push;
        player.body.knockback_vy += ny * push;
    }
}

/// Close to stand-off range and fire along the lateral axis on cooldown.
fn boss_behaviour(
    boss: &mut Enemy,
    player: &Player,
    speed_factor: f32,
    now: f32,
    ids: &mut IdAllocator,
) -> Option<Projectile> {
    let profile = enemy_profile(EnemyKind::Boss);
    let dx = player.body.x - boss.body.x;
    let dy = player.body.y - boss.body.y;
    let dist = (dx * dx + dy * dy).sqrt();
    let (nx, ny) = direction(dx, dy);
    let speed = boss.body.stats.move_speed * speed_factor;

    if dist > profile.stand_off {
        boss.body.vx = nx * speed;
        boss.body.vy = ny * speed * DEPTH_SCALE;
    } else {
        boss.body.vx = 0.0;
        boss.body.vy = 0.0;
    }
    face_along(&mut boss.body);

    if now - boss.last_shot <= BOSS_SHOT_COOLDOWN {
        return None;
    }
    boss.last_shot = now;
    let sign = if dx < 0.0 { -1.0 } else { 1.0 };
    Some(Projectile {
        id: ids.next_id(),
        owner_id: boss.id,
        owner: ProjectileOwner::Enemy,
        x: boss.body.center_x(),
        y: boss.body.center_y(),
        z: boss.body.mid_z(),
        vx: BOSS_SHOT_SPEED * sign,
        vz: BOSS_SHOT_LIFT,
        width: 8.0,
        height: 4.0,
        damage: BOSS_SHOT_DAMAGE,
        pierce: 0,
        expires_at: now + BOSS_SHOT_COOLDOWN,
    })
}

fn nova_instance(state: &mut GameState, at: &Body, now: f32) -> AttackInstance {
    let spec = nova_burst();
    AttackInstance {
        id: state.ids.next_id(),
        owner_id: state.player.id,
        expires_at: now + spec.active,
        spec,
        x: at.center_x(),
        y: at.center_y(),
        z: at.mid_z(),
        facing: Facing::Right,
        hit_ids: BTreeSet::new(),
        socket: None,
    }
}

fn collect_dead<R: Rng + ?Sized>(state: &mut GameState, now: f32, rng: &mut R) {
    let nova = state.inventory.equipped_has_tag(Tag::Nova);

    let (dead, alive): (Vec<Enemy>, Vec<Enemy>) = std::mem::take(&mut state.enemies)
        .into_iter()
        .partition(|e| !e.body.is_alive());
    state.enemies = alive;

    for enemy in dead {
        state.player.xp += enemy_profile(enemy.kind).xp_value;
        if rng.gen::<f32>() < state.tuning.drop_chance {
            let pickup = spawn_pickup(&mut state.ids, enemy.body.x, enemy.body.y, rng);
            state.pickups.push(pickup);
        }
        if nova {
            let burst = nova_instance(state, &enemy.body, now);
            state.attack_instances.push(burst);
        }
        debug!(id = enemy.id.0, kind = ?enemy.kind, "enemy defeated");
    }

    if state.boss.as_ref().is_some_and(|b| !b.body.is_alive()) {
        if let Some(boss) = state.boss.take() {
            state.player.xp += enemy_profile(EnemyKind::Boss).xp_value;
            let reward = MutationKind::Sidearm.card(2);
            let pickup = pickup_at(&mut state.ids, boss.body.x, boss.body.y, reward);
            state.pickups.push(pickup);
            if nova {
                let burst = nova_instance(state, &boss.body, now);
                state.attack_instances.push(burst);
            }
            info!(wave = state.wave, "boss defeated");
        }
    }
}

fn advance_wave<R: Rng + ?Sized>(state: &mut GameState, now: f32, rng: &mut R) {
    if !state.enemies.is_empty() || state.boss.is_some() {
        return;
    }
    state.wave += 1;
    if state.wave % state.tuning.boss_wave_interval == 0 {
        state.boss = Some(spawn_boss(&state.tuning, &mut state.ids, now));
        info!(wave = state.wave, "boss wave");
    } else {
        let count = wave_size(state.wave);
        state.enemies = spawn_wave(&state.tuning, &mut state.ids, state.wave, count, now, rng);
        info!(wave = state.wave, count, "wave started");
    }
}

fn collect_pickups(state: &mut GameState) {
    let GameState {
        pickups,
        inventory,
        player,
        ..
    } = state;
    let body = &player.body;

    pickups.retain(|pickup| {
        let near = body.z < PICKUP_MAX_HEIGHT
            && (body.x - pickup.x).abs() < PICKUP_RADIUS
            && (body.y - pickup.y).abs() < PICKUP_RADIUS;
        if near {
            let outcome = inventory.add_card(pickup.card);
            debug!(card = pickup.card.id(), ?outcome, "pickup collected");
        }
        !near
    });
}
