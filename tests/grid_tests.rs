//! Grid store arbitration and aggregation tests.

use std::collections::HashSet;
use std::sync::Arc;

use block_claim_server::grid::{CellCoord, ClaimError, GridStore};
use block_claim_server::identity::IdentityRegistry;
use block_claim_server::stats::compute_stats;
use uuid::Uuid;

#[test]
fn claim_is_visible_in_next_snapshot() {
    let grid = GridStore::new(50);
    let owner = Uuid::new_v4();

    let record = grid
        .try_claim(CellCoord::new(5, 5), owner, "Fox1", "#FF6B6B")
        .expect("first claim of (5,5) should win");

    assert_eq!(record.coord, CellCoord::new(5, 5));
    assert_eq!(record.owner, owner);

    let snapshot = grid.snapshot();
    assert_eq!(snapshot.len(), 1);
    let seen = grid.get(&CellCoord::new(5, 5)).expect("cell should be claimed");
    assert_eq!(seen.owner, owner);
    assert_eq!(seen.owner_name, "Fox1");
}

#[test]
fn second_claim_loses_and_sees_the_winner() {
    let grid = GridStore::new(50);
    let winner = Uuid::new_v4();
    let loser = Uuid::new_v4();

    grid.try_claim(CellCoord::new(10, 20), winner, "Fox1", "#FF6B6B")
        .unwrap();

    match grid.try_claim(CellCoord::new(10, 20), loser, "Wolf2", "#4ECDC4") {
        Err(ClaimError::AlreadyClaimed(existing)) => {
            assert_eq!(existing.owner, winner);
            assert_eq!(existing.owner_name, "Fox1");
        }
        other => panic!("expected AlreadyClaimed, got {other:?}"),
    }

    // Losing must not change anything
    assert_eq!(grid.claimed_count(), 1);
    assert_eq!(grid.get(&CellCoord::new(10, 20)).unwrap().owner, winner);
}

#[test]
fn out_of_bounds_claims_are_rejected_without_state_change() {
    let grid = GridStore::new(50);
    let owner = Uuid::new_v4();

    // The raw-coordinate validator refuses these outright
    assert_eq!(CellCoord::from_raw(50.0, 0.0, 50), None);
    assert_eq!(CellCoord::from_raw(0.0, 50.0, 50), None);
    assert_eq!(CellCoord::from_raw(-1.0, 0.0, 50), None);
    assert_eq!(CellCoord::from_raw(3.5, 2.0, 50), None);

    // The store re-validates even a structurally valid coordinate
    match grid.try_claim(CellCoord::new(50, 0), owner, "Fox1", "#FF6B6B") {
        Err(ClaimError::InvalidCoordinate { x, y, grid_size }) => {
            assert_eq!((x, y, grid_size), (50, 0, 50));
        }
        other => panic!("expected InvalidCoordinate, got {other:?}"),
    }

    assert_eq!(grid.claimed_count(), 0);
}

#[test]
fn concurrent_claims_on_one_cell_have_exactly_one_winner() {
    let grid = Arc::new(GridStore::new(50));
    let contested = CellCoord::new(3, 3);
    let contenders = 16;

    let results: Vec<Result<Uuid, Uuid>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..contenders)
            .map(|i| {
                let grid = Arc::clone(&grid);
                scope.spawn(move || {
                    let me = Uuid::new_v4();
                    match grid.try_claim(contested, me, &format!("Racer{i}"), "#85C1E9") {
                        Ok(record) => Ok(record.owner),
                        Err(ClaimError::AlreadyClaimed(existing)) => Err(existing.owner),
                        Err(e) => panic!("unexpected claim error: {e}"),
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<Uuid> = results.iter().filter_map(|r| r.as_ref().ok()).copied().collect();
    assert_eq!(winners.len(), 1, "exactly one claim must win");

    // Every loser observed the same committed winner
    let observed: HashSet<Uuid> = results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .copied()
        .collect();
    assert!(observed.is_subset(&HashSet::from([winners[0]])));

    assert_eq!(grid.claimed_count(), 1);
    assert_eq!(grid.get(&contested).unwrap().owner, winners[0]);
}

#[test]
fn rename_owner_backfills_every_owned_record() {
    let grid = GridStore::new(50);
    let fox = Uuid::new_v4();
    let other = Uuid::new_v4();

    grid.try_claim(CellCoord::new(0, 0), fox, "Fox1", "#FF6B6B").unwrap();
    grid.try_claim(CellCoord::new(7, 9), fox, "Fox1", "#FF6B6B").unwrap();
    grid.try_claim(CellCoord::new(1, 1), other, "Wolf2", "#4ECDC4").unwrap();

    let updated = grid.rename_owner(fox, "Bear2");
    assert_eq!(updated, 2);

    for record in grid.snapshot() {
        if record.owner == fox {
            assert_eq!(record.owner_name, "Bear2");
        } else {
            assert_eq!(record.owner_name, "Wolf2");
        }
    }
}

#[test]
fn race_scenario_totals_and_leaderboard() {
    let grid = GridStore::new(50);
    let registry = IdentityRegistry::new();

    let a = registry.register();
    let b = registry.register();

    // A wins (0,0)
    grid.try_claim(CellCoord::new(0, 0), a.id, &a.name, &a.color).unwrap();
    registry.increment_claim_count(a.id);
    assert_eq!(grid.stats().total_claimed, 1);

    // B loses (0,0) and sees A as the current owner
    match grid.try_claim(CellCoord::new(0, 0), b.id, &b.name, &b.color) {
        Err(ClaimError::AlreadyClaimed(existing)) => assert_eq!(existing.owner_name, a.name),
        other => panic!("expected AlreadyClaimed, got {other:?}"),
    }

    // B wins (1,1)
    grid.try_claim(CellCoord::new(1, 1), b.id, &b.name, &b.color).unwrap();
    registry.increment_claim_count(b.id);

    let stats = compute_stats(&grid, &registry);
    assert_eq!(stats.total_blocks, 2500);
    assert_eq!(stats.total_claimed, 2);
    assert_eq!(stats.total_unclaimed, 2498);
    assert_eq!(stats.unique_owners, 2);
    assert_eq!(stats.connected_users, 2);

    // Tied at one claim each; earliest first claim ranks first
    assert_eq!(stats.leaderboard.len(), 2);
    assert_eq!(stats.leaderboard[0].name, a.name);
    assert_eq!(stats.leaderboard[0].blocks_owned, 1);
    assert_eq!(stats.leaderboard[1].name, b.name);
    assert_eq!(stats.leaderboard[1].blocks_owned, 1);
}

#[test]
fn disconnect_keeps_claims_and_leaderboard_standing() {
    let grid = GridStore::new(50);
    let registry = IdentityRegistry::new();

    let a = registry.register();
    grid.try_claim(CellCoord::new(2, 2), a.id, &a.name, &a.color).unwrap();
    grid.try_claim(CellCoord::new(3, 2), a.id, &a.name, &a.color).unwrap();

    registry.unregister(a.id).expect("identity was connected");

    assert_eq!(grid.claimed_count(), 2);
    let stats = compute_stats(&grid, &registry);
    assert_eq!(stats.connected_users, 0);
    assert_eq!(stats.unique_owners, 1);
    assert_eq!(stats.leaderboard[0].name, a.name);
    assert_eq!(stats.leaderboard[0].blocks_owned, 2);
}

#[test]
fn leaderboard_is_capped_at_ten_and_sorted() {
    let grid = GridStore::new(50);
    let registry = IdentityRegistry::new();

    // Twelve owners; owner i claims i+1 cells
    for i in 0..12u16 {
        let owner = Uuid::new_v4();
        for j in 0..=i {
            grid.try_claim(CellCoord::new(i, j), owner, &format!("Owner{i}"), "#82E0AA")
                .unwrap();
        }
    }

    let stats = compute_stats(&grid, &registry);
    assert_eq!(stats.unique_owners, 12);
    assert_eq!(stats.leaderboard.len(), 10);
    assert_eq!(stats.leaderboard[0].name, "Owner11");
    assert_eq!(stats.leaderboard[0].blocks_owned, 12);
    let counts: Vec<u32> = stats.leaderboard.iter().map(|e| e.blocks_owned).collect();
    let mut sorted = counts.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(counts, sorted);
}
