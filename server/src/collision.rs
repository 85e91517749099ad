//! Per-tick collision pass: food collection, head-vs-body, head-vs-head.
//!
//! Runs after all snakes have moved. Deliberately a brute-force nested scan,
//! O(snakes^2 x average body length); fine at the room population cap.
//! Eliminated snakes stay in the directory until the tick loop removes them,
//! so a body that died earlier in the pass still kills within the same tick.

use crate::food::FoodField;
use crate::snake::SnakeDirectory;
use shared::{DeathStats, FOOD_RADIUS, SNAKE_HEAD_RADIUS};
use std::time::Instant;

/// Body segments taper slightly with index, floored at this radius.
const MIN_SEGMENT_RADIUS: f32 = 8.0;
const SEGMENT_TAPER_PER_INDEX: f32 = 0.1;

/// Produces at most one elimination record per snake for this tick.
pub fn resolve_collisions(
    snakes: &mut SnakeDirectory,
    food: &mut FoodField,
    now: Instant,
) -> Vec<DeathStats> {
    let ids = snakes.ids();
    let mut deaths: Vec<DeathStats> = Vec::new();

    for &id in &ids {
        let head = match snakes.get(id) {
            Some(snake) => snake.head(),
            None => continue,
        };

        // Food collection grows the snake by each item's value.
        for food_id in food.ids_near(head, SNAKE_HEAD_RADIUS + FOOD_RADIUS) {
            if let Some(item) = food.collect(food_id, now) {
                snakes.grow(id, item.value);
            }
        }

        // Head against every other snake's body, head segment excluded.
        // First colliding snake in iteration order gets the kill credit.
        let mut died = false;
        for &other_id in &ids {
            if other_id == id {
                continue;
            }
            let Some(other) = snakes.get(other_id) else {
                continue;
            };

            let mut hit = false;
            for (segment_index, segment) in other.segments.iter().enumerate().skip(1) {
                let segment_radius =
                    (SNAKE_HEAD_RADIUS - segment_index as f32 * SEGMENT_TAPER_PER_INDEX)
                        .max(MIN_SEGMENT_RADIUS);
                let collision_distance = SNAKE_HEAD_RADIUS + segment_radius;
                if head.distance_squared(*segment) < collision_distance * collision_distance {
                    hit = true;
                    break;
                }
            }

            if hit {
                let killer = other.name.clone();
                snakes.add_kill(other_id);
                deaths.push(death_record(snakes, id, Some(killer)));
                died = true;
                break;
            }
        }
        if died {
            continue;
        }

        // Head-to-head: the strictly shorter snake dies and the longer is
        // credited; an exact tie kills both with no credit either way.
        for &other_id in &ids {
            if other_id == id {
                continue;
            }
            let Some(other) = snakes.get(other_id) else {
                continue;
            };
            let Some(snake) = snakes.get(id) else {
                break;
            };

            let collision_distance = SNAKE_HEAD_RADIUS * 2.0;
            if head.distance_squared(other.head()) < collision_distance * collision_distance
                && snake.length <= other.length
            {
                let strictly_shorter = snake.length < other.length;
                let killer = strictly_shorter.then(|| other.name.clone());
                if strictly_shorter {
                    snakes.add_kill(other_id);
                }
                deaths.push(death_record(snakes, id, killer));
                break;
            }
        }
    }

    deaths
}

fn death_record(snakes: &SnakeDirectory, id: u32, killed_by: Option<String>) -> DeathStats {
    let snake = snakes.get(id).expect("victim still in directory");
    DeathStats {
        player_id: id,
        // Room population at the moment of death.
        rank: snakes.count() as u32,
        kills: snake.kills,
        max_length: snake.length.ceil() as u32,
        time_alive_secs: snake.time_alive_secs(),
        score: snake.score,
        killed_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{FoodColor, Vec2};
    use std::f32::consts::PI;

    fn spawn(directory: &mut SnakeDirectory, id: u32, x: f32, y: f32) {
        directory.spawn_at(id, &format!("snake-{}", id), "classic-blue", Vec2::new(x, y), 0.0);
    }

    #[test]
    fn test_gold_collection_grows_length_and_score_by_five() {
        let now = Instant::now();
        let mut snakes = SnakeDirectory::new();
        let mut food = FoodField::new(now);

        spawn(&mut snakes, 1, 2500.0, 2500.0);
        food.spawn_at(Vec2::new(2510.0, 2500.0), FoodColor::Gold);

        let deaths = resolve_collisions(&mut snakes, &mut food, now);
        assert!(deaths.is_empty());
        assert_eq!(food.count(), 0);

        snakes.step_all(1.0 / 60.0);
        let snake = snakes.get(1).unwrap();
        assert_eq!(snake.score, 5);
        assert!((snake.length - 15.0).abs() < 1e-4);
        assert_eq!(snake.segments.len(), 15);
    }

    #[test]
    fn test_food_out_of_reach_is_kept() {
        let now = Instant::now();
        let mut snakes = SnakeDirectory::new();
        let mut food = FoodField::new(now);

        spawn(&mut snakes, 1, 2500.0, 2500.0);
        food.spawn_at(Vec2::new(2500.0 + SNAKE_HEAD_RADIUS + FOOD_RADIUS + 1.0, 2500.0), FoodColor::White);

        resolve_collisions(&mut snakes, &mut food, now);
        assert_eq!(food.count(), 1);
        assert_eq!(snakes.get(1).unwrap().score, 0);
    }

    #[test]
    fn test_head_vs_body_one_death_one_kill() {
        let mut snakes = SnakeDirectory::new();
        let mut food = FoodField::new(Instant::now());

        // Snake 2's body trails left from (2500, 2500). Snake 1's head sits
        // on the middle of that body, its own body trailing further left,
        // well clear of snake 2's head.
        spawn(&mut snakes, 2, 2500.0, 2500.0);
        spawn(&mut snakes, 1, 2420.0, 2505.0);

        let deaths = resolve_collisions(&mut snakes, &mut food, Instant::now());

        assert_eq!(deaths.len(), 1);
        assert_eq!(deaths[0].player_id, 1);
        assert_eq!(deaths[0].killed_by.as_deref(), Some("snake-2"));
        assert_eq!(snakes.get(2).unwrap().kills, 1);
        assert_eq!(snakes.get(1).unwrap().kills, 0);
    }

    #[test]
    fn test_head_to_head_shorter_dies() {
        let mut snakes = SnakeDirectory::new();
        let mut food = FoodField::new(Instant::now());

        // Heads 30 apart (< 2 * head radius); bodies trail away from each
        // other so only the head-to-head check can fire.
        snakes.spawn_at(1, "short", "classic-blue", Vec2::new(2500.0, 2500.0), 0.0);
        snakes.spawn_at(2, "long", "classic-blue", Vec2::new(2530.0, 2500.0), PI);
        snakes.grow(2, 10); // lengths 10 vs 20

        let deaths = resolve_collisions(&mut snakes, &mut food, Instant::now());

        assert_eq!(deaths.len(), 1);
        assert_eq!(deaths[0].player_id, 1);
        assert_eq!(deaths[0].killed_by.as_deref(), Some("long"));
        assert_eq!(snakes.get(2).unwrap().kills, 1);
        assert_eq!(snakes.get(1).unwrap().kills, 0);
    }

    #[test]
    fn test_head_to_head_tie_kills_both_credits_neither() {
        let mut snakes = SnakeDirectory::new();
        let mut food = FoodField::new(Instant::now());

        snakes.spawn_at(1, "alpha", "classic-blue", Vec2::new(2500.0, 2500.0), 0.0);
        snakes.spawn_at(2, "bravo", "classic-blue", Vec2::new(2530.0, 2500.0), PI);

        let deaths = resolve_collisions(&mut snakes, &mut food, Instant::now());

        assert_eq!(deaths.len(), 2);
        assert!(deaths.iter().all(|death| death.killed_by.is_none()));
        assert_eq!(snakes.get(1).unwrap().kills, 0);
        assert_eq!(snakes.get(2).unwrap().kills, 0);
    }

    #[test]
    fn test_rank_is_population_at_death() {
        let mut snakes = SnakeDirectory::new();
        let mut food = FoodField::new(Instant::now());

        spawn(&mut snakes, 2, 2500.0, 2500.0);
        spawn(&mut snakes, 1, 2420.0, 2505.0);
        spawn(&mut snakes, 3, 800.0, 800.0);
        spawn(&mut snakes, 4, 4200.0, 4200.0);

        let deaths = resolve_collisions(&mut snakes, &mut food, Instant::now());
        assert_eq!(deaths.len(), 1);
        assert_eq!(deaths[0].rank, 4);
    }

    #[test]
    fn test_distant_snakes_unharmed() {
        let mut snakes = SnakeDirectory::new();
        let mut food = FoodField::new(Instant::now());
        spawn(&mut snakes, 1, 1000.0, 1000.0);
        spawn(&mut snakes, 2, 4000.0, 4000.0);

        let deaths = resolve_collisions(&mut snakes, &mut food, Instant::now());
        assert!(deaths.is_empty());
        assert_eq!(snakes.count(), 2);
    }

    #[test]
    fn test_body_hit_and_head_overlap_counts_once() {
        let mut snakes = SnakeDirectory::new();
        let mut food = FoodField::new(Instant::now());

        // Snake 1's head overlaps both snake 2's body and its head range.
        // The body hit wins for snake 1 (one record, body attribution);
        // snake 2 still dies to the equal-length head tie against the
        // not-yet-removed snake 1, uncredited.
        snakes.spawn_at(2, "owner", "classic-blue", Vec2::new(2500.0, 2500.0), 0.0);
        snakes.spawn_at(1, "victim", "classic-blue", Vec2::new(2470.0, 2515.0), 0.0);

        let deaths = resolve_collisions(&mut snakes, &mut food, Instant::now());

        assert_eq!(deaths.len(), 2);
        let victim = deaths.iter().find(|d| d.player_id == 1).unwrap();
        let owner = deaths.iter().find(|d| d.player_id == 2).unwrap();
        assert_eq!(victim.killed_by.as_deref(), Some("owner"));
        assert!(owner.killed_by.is_none());
        assert_eq!(snakes.get(2).unwrap().kills, 1);
        assert_eq!(snakes.get(1).unwrap().kills, 0);
    }
}
