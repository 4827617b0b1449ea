//! Longhaul Headless Simulation Harness
//!
//! Validates the progression core end to end without any engine, UI, or
//! file I/O beyond the bundled goal catalog. Runs entirely in-process on a
//! pinned clock.
//!
//! Usage:
//!   cargo run -p longhaul-simtest
//!   cargo run -p longhaul-simtest -- --verbose

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use longhaul_core::boost::ActivateError;
use longhaul_core::catalog::StaticCatalog;
use longhaul_core::clock::FixedClock;
use longhaul_core::engine::GameCore;
use longhaul_core::missions::{goals_from_json, keys};
use longhaul_core::persistence::{load_snapshot, save_snapshot};
use longhaul_core::spawner::EffectPool;
use longhaul_core::store::{MemoryStore, SaveStore};
use longhaul_logic::accrual::Accumulator;
use longhaul_logic::boost::{boosted_value, clamp_duration, BoostPhase, BoostRecord};
use longhaul_logic::drops::{pick_weighted, DropCandidate};
use longhaul_logic::goals::GoalKind;

// ── Goal catalog (same JSON a shipping client would bundle) ─────────────
const CATALOG_JSON: &str = include_str!("../../../data/goal_catalog.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Longhaul Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Goal catalog validation
    results.extend(validate_goal_catalog(verbose));

    // 2. Boost math sweep
    results.extend(validate_boost_math(verbose));

    // 3. Accumulator invariants
    results.extend(validate_accumulator(verbose));

    // 4. Weighted selection bias
    results.extend(validate_weighted_bias(verbose));

    // 5. Full boost lifecycle through the core
    results.extend(validate_boost_scenario(verbose));

    // 6. Restart recovery
    results.extend(validate_restart_recovery(verbose));

    // 7. Drop grant pacing
    results.extend(validate_drop_pacing(verbose));

    // 8. Mission tracking and claims
    results.extend(validate_missions(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Shared setup ────────────────────────────────────────────────────────

fn new_core(
    store: Rc<MemoryStore>,
    clock: Rc<FixedClock>,
    goals_json: &str,
) -> GameCore<StdRng> {
    let goals = goals_from_json(goals_json).expect("catalog parses");
    GameCore::new(
        store,
        clock,
        Rc::new(StaticCatalog::linear(5, 2.0)),
        Rc::new(EffectPool::new(16)),
        goals,
        StdRng::seed_from_u64(1234),
    )
}

/// Advance the clock and the core together, like a frame loop.
fn run(core: &mut GameCore<StdRng>, clock: &FixedClock, seconds: f64, dt: f64) {
    let steps = (seconds / dt).round() as u64;
    for _ in 0..steps {
        clock.advance_sec(dt);
        core.tick(dt);
    }
}

// ── 1. Goal catalog ─────────────────────────────────────────────────────

fn validate_goal_catalog(_verbose: bool) -> Vec<TestResult> {
    println!("--- Goal Catalog ---");
    let mut results = Vec::new();

    let goals: Vec<longhaul_logic::goals::MissionGoal> = match serde_json::from_str(CATALOG_JSON) {
        Ok(g) => g,
        Err(e) => {
            results.push(check(
                "catalog_parse",
                false,
                format!("JSON parse error: {}", e),
            ));
            return results;
        }
    };

    results.push(check(
        "catalog_not_empty",
        goals.len() >= 10,
        format!("{} goals", goals.len()),
    ));
    results.push(check(
        "catalog_targets_positive",
        goals.iter().all(|g| g.target_value > 0.0),
        "all targets > 0".into(),
    ));
    results.push(check(
        "catalog_rewards_positive",
        goals.iter().all(|g| g.reward_amount > 0),
        "all rewards > 0".into(),
    ));
    results.push(check(
        "catalog_starts_clean",
        goals
            .iter()
            .all(|g| !g.is_completed && !g.reward_claimed && g.current_value == 0.0),
        "no pre-completed goals".into(),
    ));
    results.push(check(
        "catalog_has_every_kind",
        [
            GoalKind::Accumulate,
            GoalKind::Count,
            GoalKind::ReachValue,
            GoalKind::Unlock,
            GoalKind::MultiReachEachAtLeast,
        ]
        .iter()
        .all(|k| goals.iter().any(|g| g.kind == *k)),
        "all five kinds present".into(),
    ));

    results
}

// ── 2. Boost math ───────────────────────────────────────────────────────

fn validate_boost_math(_verbose: bool) -> Vec<TestResult> {
    println!("--- Boost Math ---");
    let mut results = Vec::new();

    results.push(check(
        "duration_clamp",
        clamp_duration(600.0) == 45.0 && clamp_duration(0.0) == 1.0,
        "clamped to [1, 45] s".into(),
    ));
    results.push(check(
        "boosted_value_50pct",
        (boosted_value(10.0, 50.0) - 15.0).abs() < 1e-9,
        "10 +50% = 15".into(),
    ));

    let record = BoostRecord {
        active_until_ms: 10_000,
        cooldown_until_ms: 0,
        ..Default::default()
    };
    results.push(check(
        "phase_from_timestamps",
        record.phase(5_000) == BoostPhase::Active && record.phase(10_000) == BoostPhase::Idle,
        "phase derives from deadlines".into(),
    ));

    results
}

// ── 3. Accumulator ──────────────────────────────────────────────────────

fn validate_accumulator(_verbose: bool) -> Vec<TestResult> {
    println!("--- Accumulator ---");
    let mut results = Vec::new();

    let mut acc = Accumulator::new();
    let mut ok = true;
    let mut grants = 0u32;
    for step in 0..1_000 {
        let dt = (step % 7) as f64 * 0.05;
        let rate = (step % 5) as f64 * 0.9;
        acc.advance(dt, rate);
        while acc.consume_unit() {
            grants += 1;
        }
        if acc.fraction() < 0.0 || acc.fraction() >= 1.0 {
            ok = false;
            break;
        }
    }
    results.push(check(
        "accumulator_invariants",
        ok,
        format!("{} grants, fraction in [0, 1) after every tick", grants),
    ));

    let mut acc = Accumulator::new();
    let mut grants = 0u32;
    for _ in 0..3 {
        acc.advance(1.0, 2.5);
        while acc.consume_unit() {
            grants += 1;
        }
    }
    results.push(check(
        "accumulator_2_5_per_sec",
        grants == 7 || grants == 8,
        format!("3 ticks at 2.5/s -> {} grants", grants),
    ));

    results
}

// ── 4. Weighted bias ────────────────────────────────────────────────────

fn validate_weighted_bias(verbose: bool) -> Vec<TestResult> {
    println!("--- Weighted Selection ---");
    let mut results = Vec::new();

    // Two candidates with power-1 weights 1.0 and 0.5: expect ~2:1.
    let candidates = vec![
        DropCandidate {
            id: 0,
            unlock_threshold: 0.0,
        },
        DropCandidate {
            id: 1,
            unlock_threshold: 0.0,
        },
    ];

    use rand::Rng;
    let mut rng = StdRng::seed_from_u64(99);
    let n = 60_000u32;
    let mut first = 0u32;
    for _ in 0..n {
        let roll: f64 = rng.gen();
        if pick_weighted(&candidates, roll, 1.0) == Some(0) {
            first += 1;
        }
    }
    let ratio = first as f64 / (n - first) as f64;
    if verbose {
        println!("  observed ratio {:.3}", ratio);
    }
    results.push(check(
        "weighted_bias_2_to_1",
        ratio > 1.85 && ratio < 2.15,
        format!("{} draws, ratio {:.3}", n, ratio),
    ));

    results.push(check(
        "weighted_fallback_last",
        pick_weighted(&candidates, 1.0, 1.0) == Some(1) && pick_weighted(&[], 0.5, 1.0).is_none(),
        "roll 1.0 falls back to last; empty list is None".into(),
    ));

    results
}

// ── 5. Boost lifecycle scenario ─────────────────────────────────────────

fn validate_boost_scenario(_verbose: bool) -> Vec<TestResult> {
    println!("--- Boost Lifecycle ---");
    let mut results = Vec::new();

    let store = Rc::new(MemoryStore::new());
    let clock = Rc::new(FixedClock::new(1_700_000_000_000));
    store.set_speed(10.0);
    store.set_boost_unlocked(true);
    store.set_boost_record(BoostRecord {
        multiplier_percent: 50.0,
        duration_sec: 10.0,
        cooldown_sec: 30.0,
        ..Default::default()
    });

    let mut core = new_core(store.clone(), clock.clone(), CATALOG_JSON);
    core.recover();

    core.activate_boost().expect("activation from idle");
    results.push(check(
        "boost_applies_multiplier",
        (store.speed() - 15.0).abs() < 1e-9,
        format!("speed {}", store.speed()),
    ));

    run(&mut core, &clock, 10.0, 0.25);
    results.push(check(
        "boost_restores_baseline",
        (store.speed() - 10.0).abs() < 1e-9,
        format!("speed {} after window", store.speed()),
    ));
    results.push(check(
        "cooldown_refuses_activation",
        core.activate_boost() == Err(ActivateError::OnCooldown),
        format!(
            "{:.1}s cooldown remaining",
            core.boost.remaining_cooldown_seconds()
        ),
    ));

    run(&mut core, &clock, 30.0, 0.25);
    results.push(check(
        "idle_after_cooldown",
        core.activate_boost().is_ok(),
        "reactivation accepted".into(),
    ));

    results
}

// ── 6. Restart recovery ─────────────────────────────────────────────────

fn validate_restart_recovery(_verbose: bool) -> Vec<TestResult> {
    println!("--- Restart Recovery ---");
    let mut results = Vec::new();

    let store = Rc::new(MemoryStore::new());
    let clock = Rc::new(FixedClock::new(1_700_000_000_000));
    store.set_speed(10.0);
    store.set_boost_unlocked(true);
    store.set_boost_record(BoostRecord {
        multiplier_percent: 50.0,
        duration_sec: 20.0,
        cooldown_sec: 5.0,
        ..Default::default()
    });

    let mut core = new_core(store.clone(), clock.clone(), CATALOG_JSON);
    core.recover();
    core.activate_boost().expect("activation");
    core.missions.set_unlocked("boost_unlocked");
    let deadline = store.boost_record().active_until_ms;

    // Snapshot mid-window, as a suspend would.
    let mut snapshot = Vec::new();
    save_snapshot(&mut snapshot, &store, core.missions.goals(), 0.0).expect("snapshot");
    run(&mut core, &clock, 5.0, 1.0);
    core.shutdown();

    // "Restart": fresh store from the snapshot, stale live speed, clock 5 s on.
    let loaded = load_snapshot(&snapshot[..]).expect("snapshot load");
    let restored = Rc::new(MemoryStore::with_state(loaded.state));
    restored.set_speed(1.0); // fresh-boot default, not to be trusted
    let mut fresh = new_core(restored.clone(), clock.clone(), "[]");
    fresh.missions.restore_goals(loaded.goals);
    fresh.drops.restore_accumulator(loaded.accumulator);
    fresh.recover();

    results.push(check(
        "recovery_reapplies_boost",
        (restored.speed() - 15.0).abs() < 1e-9,
        format!("speed {} from persisted base", restored.speed()),
    ));
    results.push(check(
        "recovery_restores_goal_progress",
        fresh.missions.claim("boost_unlocked") == Ok(50),
        "goal completed before the snapshot is claimable after".into(),
    ));
    results.push(check(
        "recovery_keeps_deadline",
        restored.boost_record().active_until_ms == deadline,
        "no duration extension across restart".into(),
    ));

    run(&mut fresh, &clock, 15.0, 1.0);
    results.push(check(
        "recovery_restores_on_time",
        (restored.speed() - 10.0).abs() < 1e-9,
        format!("speed {} after remaining window", restored.speed()),
    ));

    results
}

// ── 7. Drop pacing ──────────────────────────────────────────────────────

fn validate_drop_pacing(_verbose: bool) -> Vec<TestResult> {
    println!("--- Drop Pacing ---");
    let mut results = Vec::new();

    let store = Rc::new(MemoryStore::new());
    let clock = Rc::new(FixedClock::new(1_700_000_000_000));
    store.set_income_per_second(2.5);

    let mut core = new_core(store.clone(), clock.clone(), "[]");
    core.recover();
    for _ in 0..3 {
        clock.advance_sec(1.0);
        core.tick(1.0);
    }

    let total = store.resource_total();
    results.push(check(
        "grants_match_rate",
        total == 7 || total == 8,
        format!("rate 2.5/s over 3 s -> {} grants", total),
    ));
    results.push(check(
        "grant_counter_matches_store",
        core.drops.grants_total() == total as u64,
        format!("engine counted {} grants", core.drops.grants_total()),
    ));
    results.push(check(
        "fraction_below_one",
        core.drops.accumulator_fraction() < 1.0,
        format!("fraction {:.3}", core.drops.accumulator_fraction()),
    ));

    // Only id 0 is unlocked at distance 0.
    let counts = store.resource_counts();
    results.push(check(
        "locked_ids_untouched",
        counts.len() == 1,
        format!("counts {:?}", counts),
    ));

    results
}

// ── 8. Missions ─────────────────────────────────────────────────────────

fn validate_missions(_verbose: bool) -> Vec<TestResult> {
    println!("--- Missions ---");
    let mut results = Vec::new();

    let store = Rc::new(MemoryStore::new());
    let clock = Rc::new(FixedClock::new(1_700_000_000_000));
    store.set_speed(90.0);
    store.set_boost_unlocked(true);
    store.set_boost_record(BoostRecord {
        multiplier_percent: 50.0,
        duration_sec: 10.0,
        cooldown_sec: 1.0,
        ..Default::default()
    });

    let mut core = new_core(store.clone(), clock.clone(), CATALOG_JSON);
    core.recover();
    let rx = core.missions.subscribe();
    core.missions.set_unlocked("boost_unlocked");

    results.push(check(
        "catalog_declares_ambient_goals",
        core.missions.has_goal(keys::DISTANCE_KM, GoalKind::ReachValue)
            && core
                .missions
                .has_goal(keys::RESOURCE_SET, GoalKind::MultiReachEachAtLeast),
        "ambient keys present with expected kinds".into(),
    ));

    store.set_distance_km(150.0); // past the Easy and Normal distance tiers
    run(&mut core, &clock, 60.0, 1.0);

    let top_speed_done = core
        .missions
        .goals()
        .iter()
        .any(|g| g.key == keys::TOP_SPEED && g.is_completed);
    results.push(check(
        "ambient_top_speed_tracked",
        top_speed_done,
        "90 km/h completed the 80 km/h goal".into(),
    ));

    results.push(check(
        "notification_raised",
        rx.try_recv().is_ok(),
        "change signal observed".into(),
    ));

    let claimed = core.missions.claim("boost_unlocked");
    results.push(check(
        "claim_pays_reward",
        claimed == Ok(50) && store.gold() >= 50,
        format!("claim -> {:?}, gold {}", claimed, store.gold()),
    ));
    results.push(check(
        "claim_is_final",
        core.missions.claim("boost_unlocked")
            == Err(longhaul_logic::goals::ClaimError::AlreadyClaimed),
        "second claim refused".into(),
    ));
    results.push(check(
        "claim_flushed_synchronously",
        store.flush_count() >= 1,
        format!("{} flushes", store.flush_count()),
    ));

    // The catalog reuses distance_km across tiers; claims walk them in order.
    let easy = core.missions.claim(keys::DISTANCE_KM);
    let normal = core.missions.claim(keys::DISTANCE_KM);
    results.push(check(
        "claim_walks_shared_key_tiers",
        easy == Ok(100) && normal == Ok(750),
        format!("tier payouts {:?}, {:?}", easy, normal),
    ));
    results.push(check(
        "claim_blocks_on_incomplete_tier",
        core.missions.claim(keys::DISTANCE_KM)
            == Err(longhaul_logic::goals::ClaimError::NotCompleted),
        "hard tier still pending at 150 km".into(),
    ));

    results
}
