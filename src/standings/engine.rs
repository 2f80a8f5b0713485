use std::cmp::Ordering;
use std::collections::HashMap;

use super::config::{StandingsConfig, TiePolicy};
use crate::backend::types::{Match, MatchStatus, SpiritScore, Team};

/// Win/loss record of one team over completed matches
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStanding {
    pub team_id: String,
    pub team_name: String,
    pub wins: u32,
    pub losses: u32,
    /// Always 0 under `TiePolicy::Loss`
    pub draws: u32,
    pub points_for: u32,
    pub points_against: u32,
}

impl PerformanceStanding {
    fn new(team: &Team) -> Self {
        Self {
            team_id: team.id.clone(),
            team_name: team.name.clone(),
            wins: 0,
            losses: 0,
            draws: 0,
            points_for: 0,
            points_against: 0,
        }
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn point_differential(&self) -> i64 {
        i64::from(self.points_for) - i64::from(self.points_against)
    }

    fn record(&mut self, own: u32, opponent: u32, ties: TiePolicy) {
        self.points_for += own;
        self.points_against += opponent;
        match own.cmp(&opponent) {
            Ordering::Greater => self.wins += 1,
            Ordering::Less => self.losses += 1,
            Ordering::Equal => match ties {
                TiePolicy::Loss => self.losses += 1,
                TiePolicy::Draw => self.draws += 1,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpiritStanding {
    pub team_id: String,
    pub team_name: String,
    /// Mean sheet total; 0.0 when nothing was received
    pub average: f64,
    pub scores_received: usize,
}

/// One row of the combined leaderboard, with the two weighted terms that
/// make up its composite score.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedStanding {
    pub team_id: String,
    pub team_name: String,
    pub wins: u32,
    pub max_wins: u32,
    pub spirit_average: f64,
    pub performance_component: f64,
    pub spirit_component: f64,
    pub composite: f64,
}

/// All three leaderboard views of one tournament
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Standings {
    pub performance: Vec<PerformanceStanding>,
    pub spirit: Vec<SpiritStanding>,
    pub combined: Vec<CombinedStanding>,
}

impl Standings {
    pub fn is_empty(&self) -> bool {
        self.performance.is_empty()
    }

    pub fn team_count(&self) -> usize {
        self.performance.len()
    }

    /// Position (1-based) of a team on the combined leaderboard
    pub fn combined_rank(&self, team_id: &str) -> Option<usize> {
        self.combined.iter().position(|c| c.team_id == team_id).map(|i| i + 1)
    }

    pub fn spirit_of(&self, team_id: &str) -> Option<&SpiritStanding> {
        self.spirit.iter().find(|s| s.team_id == team_id)
    }
}

fn by_name_then_id(a_name: &str, a_id: &str, b_name: &str, b_id: &str) -> Ordering {
    a_name
        .to_lowercase()
        .cmp(&b_name.to_lowercase())
        .then_with(|| a_id.cmp(b_id))
}

/// Win/loss standings for approved teams, best first.
///
/// Ordered by wins, then point differential, then team name and id so
/// identical inputs always give identical output.
pub fn performance_standings(teams: &[Team], matches: &[Match], ties: TiePolicy) -> Vec<PerformanceStanding> {
    let mut standings: Vec<PerformanceStanding> = teams
        .iter()
        .filter(|t| t.is_approved())
        .map(PerformanceStanding::new)
        .collect();

    let index: HashMap<String, usize> = standings
        .iter()
        .enumerate()
        .map(|(i, s)| (s.team_id.clone(), i))
        .collect();

    for m in matches.iter().filter(|m| m.status == MatchStatus::Completed) {
        if let Some(&i) = index.get(&m.team_a_id) {
            standings[i].record(m.team_a_score, m.team_b_score, ties);
        }
        if let Some(&i) = index.get(&m.team_b_id) {
            standings[i].record(m.team_b_score, m.team_a_score, ties);
        }
    }

    standings.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.point_differential().cmp(&a.point_differential()))
            .then_with(|| by_name_then_id(&a.team_name, &a.team_id, &b.team_name, &b.team_id))
    });
    standings
}

/// Average spirit received by each approved team, best first.
pub fn spirit_standings(teams: &[Team], scores: &[SpiritScore]) -> Vec<SpiritStanding> {
    let mut received: HashMap<&str, (u64, usize)> = HashMap::new();
    for score in scores {
        let entry = received.entry(score.to_team_id.as_str()).or_insert((0, 0));
        entry.0 += u64::from(score.effective_total());
        entry.1 += 1;
    }

    let mut standings: Vec<SpiritStanding> = teams
        .iter()
        .filter(|t| t.is_approved())
        .map(|team| {
            let (sum, count) = received.get(team.id.as_str()).copied().unwrap_or((0, 0));
            let average = if count == 0 { 0.0 } else { sum as f64 / count as f64 };
            SpiritStanding {
                team_id: team.id.clone(),
                team_name: team.name.clone(),
                average,
                scores_received: count,
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.average
            .total_cmp(&a.average)
            .then_with(|| by_name_then_id(&a.team_name, &a.team_id, &b.team_name, &b.team_id))
    });
    standings
}

/// Blend performance and spirit into one ranking.
///
/// `composite = wins / max_wins * performance_weight
///            + spirit_average / max_spirit_total * spirit_weight`
///
/// `max_wins` is floored at 1, so before any match is completed the ranking
/// is decided by spirit alone. Equal composites keep performance order.
pub fn combined_standings(
    performance: &[PerformanceStanding],
    spirit: &[SpiritStanding],
    config: &StandingsConfig,
) -> Vec<CombinedStanding> {
    let max_wins = performance.iter().map(|p| p.wins).max().unwrap_or(0).max(1);
    let spirit_by_team: HashMap<&str, f64> = spirit
        .iter()
        .map(|s| (s.team_id.as_str(), s.average))
        .collect();

    let mut combined: Vec<CombinedStanding> = performance
        .iter()
        .map(|p| {
            let spirit_average = spirit_by_team.get(p.team_id.as_str()).copied().unwrap_or(0.0);
            // multiply before dividing so whole-number inputs stay exact
            let performance_component =
                f64::from(p.wins) * config.performance_weight / f64::from(max_wins);
            let spirit_component = if config.max_spirit_total > 0.0 {
                spirit_average * config.spirit_weight / config.max_spirit_total
            } else {
                0.0
            };
            CombinedStanding {
                team_id: p.team_id.clone(),
                team_name: p.team_name.clone(),
                wins: p.wins,
                max_wins,
                spirit_average,
                performance_component,
                spirit_component,
                composite: performance_component + spirit_component,
            }
        })
        .collect();

    // sort_by is stable: equal composites stay in performance order
    combined.sort_by(|a, b| b.composite.total_cmp(&a.composite));
    combined
}

/// Compute every leaderboard view from raw tournament rows.
pub fn compute_standings(
    teams: &[Team],
    matches: &[Match],
    scores: &[SpiritScore],
    config: &StandingsConfig,
) -> Standings {
    let performance = performance_standings(teams, matches, config.tie_policy);
    let spirit = spirit_standings(teams, scores);
    let combined = combined_standings(&performance, &spirit, config);
    Standings {
        performance,
        spirit,
        combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::TeamStatus;
    use chrono::{TimeZone, Utc};

    fn team(id: &str, name: &str) -> Team {
        team_with_status(id, name, TeamStatus::Approved)
    }

    fn team_with_status(id: &str, name: &str, status: TeamStatus) -> Team {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        Team {
            id: id.to_string(),
            tournament_id: "t1".to_string(),
            name: name.to_string(),
            captain_id: "cap".to_string(),
            email: format!("{}@example.org", id),
            phone: "555-0100".to_string(),
            status,
            logo_url: None,
            notes: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn game(a: &str, b: &str, score_a: u32, score_b: u32, status: MatchStatus) -> Match {
        let ts = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Match {
            id: format!("{}-{}-{}-{}", a, b, score_a, score_b),
            tournament_id: "t1".to_string(),
            team_a_id: a.to_string(),
            team_b_id: b.to_string(),
            field: "1".to_string(),
            scheduled_time: ts,
            team_a_score: score_a,
            team_b_score: score_b,
            status,
            notes: None,
            created_at: ts,
            updated_at: ts,
            team_a: None,
            team_b: None,
        }
    }

    fn done(a: &str, b: &str, score_a: u32, score_b: u32) -> Match {
        game(a, b, score_a, score_b, MatchStatus::Completed)
    }

    fn spirit(to: &str, total: u32) -> SpiritScore {
        SpiritScore {
            id: format!("s-{}-{}", to, total),
            match_id: "m".to_string(),
            from_team_id: "other".to_string(),
            to_team_id: to.to_string(),
            rules: 0,
            fouls: 0,
            fairness: 0,
            attitude: 0,
            communication: 0,
            total: Some(total),
            comments: None,
            submitted_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn ids<T>(rows: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
        rows.iter().map(|r| id(r).to_string()).collect()
    }

    #[test]
    fn test_empty_inputs() {
        let standings = compute_standings(&[], &[], &[], &StandingsConfig::default());
        assert!(standings.is_empty());
        assert!(standings.spirit.is_empty());
        assert!(standings.combined.is_empty());
    }

    #[test]
    fn test_team_without_completed_matches() {
        let teams = vec![team("a", "Alpha"), team("b", "Bravo")];
        let matches = vec![
            game("a", "b", 5, 3, MatchStatus::Live),
            game("a", "b", 0, 0, MatchStatus::Upcoming),
        ];
        let perf = performance_standings(&teams, &matches, TiePolicy::Loss);
        for p in &perf {
            assert_eq!(p.wins, 0);
            assert_eq!(p.losses, 0);
            assert_eq!(p.point_differential(), 0);
            assert_eq!(p.games_played(), 0);
        }
    }

    #[test]
    fn test_accumulates_from_both_sides() {
        let teams = vec![team("a", "Alpha"), team("b", "Bravo"), team("c", "Charlie")];
        let matches = vec![done("a", "b", 15, 10), done("c", "a", 13, 11), done("b", "c", 15, 2)];
        let perf = performance_standings(&teams, &matches, TiePolicy::Loss);

        let a = perf.iter().find(|p| p.team_id == "a").unwrap();
        assert_eq!((a.wins, a.losses), (1, 1));
        assert_eq!((a.points_for, a.points_against), (26, 23));
        assert_eq!(a.point_differential(), 3);

        // games played equals completed matches referencing the team
        for p in &perf {
            let referencing = matches.iter().filter(|m| m.involves(&p.team_id)).count() as u32;
            assert_eq!(p.games_played(), referencing);
            assert_eq!(p.wins + p.losses, referencing);
        }
    }

    #[test]
    fn test_only_approved_teams_are_ranked() {
        let teams = vec![
            team("a", "Alpha"),
            team_with_status("p", "Pending Squad", TeamStatus::Pending),
            team_with_status("r", "Rejected Squad", TeamStatus::Rejected),
        ];
        let matches = vec![done("a", "p", 15, 3)];
        let standings = compute_standings(&teams, &matches, &[spirit("p", 20)], &StandingsConfig::default());
        assert_eq!(ids(&standings.performance, |p| &p.team_id), vec!["a"]);
        assert_eq!(ids(&standings.spirit, |s| &s.team_id), vec!["a"]);
        // the win against an unapproved team still counts for the approved one
        assert_eq!(standings.performance[0].wins, 1);
    }

    #[test]
    fn test_performance_sort_keys() {
        let teams = vec![
            team("d", "delta"),
            team("c", "Charlie"),
            team("b", "Bravo"),
            team("a", "Alpha"),
        ];
        // a: 3 wins, b: 1 win +9, c: 1 win +2, d: 0 wins
        let matches = vec![
            done("a", "d", 15, 0),
            done("a", "c", 15, 14),
            done("b", "d", 15, 5),
            done("c", "d", 15, 12),
            done("b", "a", 14, 15),
        ];
        let perf = performance_standings(&teams, &matches, TiePolicy::Loss);
        assert_eq!(ids(&perf, |p| &p.team_id), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_equal_records_fall_back_to_name_then_id() {
        let teams = vec![team("z2", "zulu"), team("z1", "Zulu"), team("m", "Mike")];
        let perf = performance_standings(&teams, &[], TiePolicy::Loss);
        assert_eq!(ids(&perf, |p| &p.team_id), vec!["m", "z1", "z2"]);

        // deterministic whatever the input order
        let reversed: Vec<Team> = teams.into_iter().rev().collect();
        let again = performance_standings(&reversed, &[], TiePolicy::Loss);
        assert_eq!(ids(&again, |p| &p.team_id), vec!["m", "z1", "z2"]);
    }

    #[test]
    fn test_tied_match_is_a_loss_for_both_by_default() {
        let teams = vec![team("a", "Alpha"), team("b", "Bravo")];
        let perf = performance_standings(&teams, &[done("a", "b", 11, 11)], TiePolicy::Loss);
        for p in &perf {
            assert_eq!((p.wins, p.losses, p.draws), (0, 1, 0));
            assert_eq!(p.point_differential(), 0);
        }
    }

    #[test]
    fn test_tied_match_is_a_draw_under_draw_policy() {
        let teams = vec![team("a", "Alpha"), team("b", "Bravo")];
        let perf = performance_standings(&teams, &[done("a", "b", 11, 11)], TiePolicy::Draw);
        for p in &perf {
            assert_eq!((p.wins, p.losses, p.draws), (0, 0, 1));
            assert_eq!(p.games_played(), 1);
        }
    }

    #[test]
    fn test_spirit_average_without_scores_is_zero() {
        let teams = vec![team("a", "Alpha")];
        let spirit = spirit_standings(&teams, &[]);
        assert_eq!(spirit[0].average, 0.0);
        assert!(!spirit[0].average.is_nan());
        assert_eq!(spirit[0].scores_received, 0);
    }

    #[test]
    fn test_spirit_average_and_order() {
        let teams = vec![team("a", "Alpha"), team("b", "Bravo"), team("c", "Charlie")];
        let scores = vec![spirit("a", 12), spirit("a", 14), spirit("b", 15), spirit("c", 13)];
        let standings = spirit_standings(&teams, &scores);
        assert_eq!(ids(&standings, |s| &s.team_id), vec!["b", "a", "c"]);
        assert_eq!(standings[1].average, 13.0);
        assert_eq!(standings[1].scores_received, 2);
        // a and c tie on 13.0, name decides
        assert_eq!(standings[2].average, 13.0);
    }

    #[test]
    fn test_spirit_uses_category_sum_when_total_missing() {
        let teams = vec![team("a", "Alpha")];
        let mut score = spirit("a", 0);
        score.total = None;
        score.rules = 4;
        score.fouls = 3;
        score.fairness = 4;
        score.attitude = 3;
        score.communication = 2;
        let standings = spirit_standings(&teams, &[score]);
        assert_eq!(standings[0].average, 16.0);
    }

    #[test]
    fn test_perfect_team_scores_exactly_100() {
        let teams = vec![team("a", "Alpha"), team("b", "Bravo")];
        let matches = vec![done("a", "b", 15, 9), done("a", "b", 15, 12)];
        let scores = vec![spirit("a", 20), spirit("a", 20)];
        let standings = compute_standings(&teams, &matches, &scores, &StandingsConfig::default());
        let top = &standings.combined[0];
        assert_eq!(top.team_id, "a");
        assert_eq!(top.composite, 100.0);
        assert_eq!(top.performance_component, 70.0);
        assert_eq!(top.spirit_component, 30.0);
    }

    #[test]
    fn test_no_completed_matches_ranks_on_spirit_alone() {
        let teams = vec![team("a", "Alpha"), team("b", "Bravo"), team("c", "Charlie")];
        let matches = vec![game("a", "b", 7, 3, MatchStatus::Live)];
        let scores = vec![spirit("a", 10), spirit("b", 16), spirit("c", 12)];
        let standings = compute_standings(&teams, &matches, &scores, &StandingsConfig::default());

        assert_eq!(ids(&standings.combined, |c| &c.team_id), vec!["b", "c", "a"]);
        for c in &standings.combined {
            assert_eq!(c.max_wins, 1);
            assert_eq!(c.performance_component, 0.0);
            let expected = c.spirit_average / 20.0 * 30.0;
            assert!((c.composite - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_combined_weighting_inverts_performance_order() {
        // A and B both go 3-1; A has the better differential, B the better spirit
        let teams = vec![team("a", "A"), team("b", "B"), team("x", "X"), team("y", "Y")];
        let matches = vec![
            done("a", "x", 15, 10),
            done("a", "y", 15, 10),
            done("a", "x", 15, 10),
            done("a", "b", 10, 13),
            done("b", "x", 15, 13),
            done("b", "y", 15, 14),
            done("y", "b", 15, 14),
        ];
        let scores = vec![spirit("a", 18), spirit("b", 19)];
        let standings = compute_standings(&teams, &matches, &scores, &StandingsConfig::default());

        let a = standings.performance.iter().find(|p| p.team_id == "a").unwrap();
        let b = standings.performance.iter().find(|p| p.team_id == "b").unwrap();
        assert_eq!((a.wins, a.losses, a.point_differential()), (3, 1, 12));
        assert_eq!((b.wins, b.losses, b.point_differential()), (3, 1, 5));
        assert_eq!(ids(&standings.performance[..2], |p| &p.team_id), vec!["a", "b"]);

        assert_eq!(ids(&standings.combined[..2], |c| &c.team_id), vec!["b", "a"]);
        assert_eq!(standings.combined_rank("b"), Some(1));
        assert_eq!(standings.combined_rank("nobody"), None);
        assert_eq!(standings.spirit_of("a").map(|s| s.average), Some(18.0));
        assert!((standings.combined[0].composite - 98.5).abs() < 1e-9);
        assert!((standings.combined[1].composite - 97.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_composites_keep_performance_order() {
        let teams = vec![team("b", "Bravo"), team("a", "Alpha")];
        let standings = compute_standings(&teams, &[], &[], &StandingsConfig::default());
        assert_eq!(ids(&standings.combined, |c| &c.team_id), vec!["a", "b"]);
    }

    #[test]
    fn test_custom_weights() {
        let teams = vec![team("a", "Alpha"), team("b", "Bravo")];
        let matches = vec![done("a", "b", 15, 3)];
        let scores = vec![spirit("a", 10), spirit("b", 20)];
        let config = StandingsConfig {
            performance_weight: 50.0,
            spirit_weight: 50.0,
            ..StandingsConfig::default()
        };
        let standings = compute_standings(&teams, &matches, &scores, &config);
        let a = standings.combined.iter().find(|c| c.team_id == "a").unwrap();
        let b = standings.combined.iter().find(|c| c.team_id == "b").unwrap();
        assert_eq!(a.composite, 75.0);
        assert_eq!(b.composite, 50.0);
    }
}
