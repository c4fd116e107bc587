//! Derived-metric calculations.
//!
//! Pure functions over numeric inputs so the scoring rules stay unit-testable
//! away from the HTTP and store layers.

use chrono::NaiveDate;

/// Weighting of the four performance sub-scores.
const ATTENDANCE_WEIGHT: f64 = 0.25;
const TASK_WEIGHT: f64 = 0.35;
const PROJECT_WEIGHT: f64 = 0.25;
const DATA_ENTRY_WEIGHT: f64 = 0.15;

/// Start of the status-tracking grid. The grid denominator is this fixed
/// range, not the assignment's own span.
pub fn tracking_window_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 5).unwrap_or_default()
}

/// End of the status-tracking grid (inclusive).
pub fn tracking_window_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 2, 28).unwrap_or_default()
}

/// Total days in the tracking window, inclusive of both endpoints.
pub fn tracking_window_days() -> i64 {
    (tracking_window_end() - tracking_window_start()).num_days() + 1
}

/// Whether a YYYY-MM-DD date string falls inside the tracking window.
pub fn in_tracking_window(date: &str) -> bool {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d >= tracking_window_start() && d <= tracking_window_end(),
        Err(_) => false,
    }
}

/// completed / total × 100, rounded. Zero when there is nothing to complete.
pub fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Completion percentage of a status grid against the fixed tracking window.
pub fn window_completion_percentage(completed_days: usize) -> u32 {
    ((completed_days as f64 / tracking_window_days() as f64) * 100.0).round() as u32
}

/// Task-completion-rate input derived from completed project count.
pub fn task_completion_rate(completed_projects: u32) -> f64 {
    f64::from(completed_projects * 15).min(100.0)
}

/// Weighted overall performance score.
///
/// Attendance 25%, task completion 35%, projects completed 25% (10 points
/// per project), data entries 15% (5 points per entry); every sub-score is
/// capped at 100 before weighting.
pub fn performance_score(
    attendance_rate: f64,
    task_completion_rate: f64,
    projects_completed: u32,
    data_entries: u32,
) -> u32 {
    let attendance = attendance_rate.min(100.0);
    let tasks = task_completion_rate.min(100.0);
    let projects = f64::from(projects_completed * 10).min(100.0);
    let data = f64::from(data_entries * 5).min(100.0);

    let overall = attendance * ATTENDANCE_WEIGHT
        + tasks * TASK_WEIGHT
        + projects * PROJECT_WEIGHT
        + data * DATA_ENTRY_WEIGHT;

    overall.round() as u32
}

/// Displayed sub-scores for the performance table. These mirror the overall
/// formula's weighted terms, rounded individually.
pub fn attendance_score(attendance_rate: f64) -> u32 {
    (attendance_rate * ATTENDANCE_WEIGHT).round() as u32
}

pub fn task_completion_score(task_completion_rate: f64) -> u32 {
    (task_completion_rate * TASK_WEIGHT).round() as u32
}

pub fn projects_completed_score(projects_completed: u32) -> u32 {
    (f64::from(projects_completed * 10).min(100.0) * PROJECT_WEIGHT).round() as u32
}

pub fn data_entry_score(data_entries: u32) -> u32 {
    (f64::from(data_entries * 5).min(100.0) * DATA_ENTRY_WEIGHT).round() as u32
}

/// Count `@Name` mentions of a member in a free-text activity.
///
/// Matching is case-insensitive and tolerates collapsed or stretched
/// whitespace between name parts ("@Sachin Kumar", "@sachinkumar"). When the
/// full name never matches, a bare `@firstname` counts once.
pub fn count_mentions(activity: &str, member_name: &str) -> usize {
    let text = activity.to_lowercase();
    let parts: Vec<String> = member_name
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if parts.is_empty() {
        return 0;
    }

    let mut count = 0;
    for (at_idx, _) in text.match_indices('@') {
        let mut pos = at_idx + 1;
        let mut matched = true;
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                while let Some(ch) = text[pos..].chars().next() {
                    if ch.is_whitespace() {
                        pos += ch.len_utf8();
                    } else {
                        break;
                    }
                }
            }
            if text[pos..].starts_with(part.as_str()) {
                pos += part.len();
            } else {
                matched = false;
                break;
            }
        }
        if matched {
            count += 1;
        }
    }

    if count == 0 && text.contains(&format!("@{}", parts[0])) {
        count = 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_rate_rounds() {
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(3, 3), 100);
    }

    #[test]
    fn completion_rate_zero_total_is_zero() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(5, 0), 0);
    }

    #[test]
    fn tracking_window_is_86_days() {
        assert_eq!(tracking_window_days(), 86);
    }

    #[test]
    fn tracking_window_membership() {
        assert!(in_tracking_window("2024-12-05"));
        assert!(in_tracking_window("2025-01-15"));
        assert!(in_tracking_window("2025-02-28"));
        assert!(!in_tracking_window("2024-12-04"));
        assert!(!in_tracking_window("2025-03-01"));
        assert!(!in_tracking_window("not-a-date"));
    }

    #[test]
    fn window_completion_percentage_uses_fixed_denominator() {
        assert_eq!(window_completion_percentage(0), 0);
        assert_eq!(window_completion_percentage(43), 50);
        assert_eq!(window_completion_percentage(86), 100);
    }

    #[test]
    fn performance_score_reference_vector() {
        // 80*0.25 + 60*0.35 + min(20,100)*0.25 + min(15,100)*0.15
        // = 20 + 21 + 5 + 2.25 = 48.25 → 48
        assert_eq!(performance_score(80.0, 60.0, 2, 3), 48);
    }

    #[test]
    fn performance_score_caps_each_component() {
        // Everything saturated: 100 across the board.
        assert_eq!(performance_score(250.0, 180.0, 50, 99), 100);
    }

    #[test]
    fn performance_score_zero_inputs() {
        assert_eq!(performance_score(0.0, 0.0, 0, 0), 0);
    }

    #[test]
    fn task_completion_rate_caps_at_100() {
        assert_eq!(task_completion_rate(2), 30.0);
        assert_eq!(task_completion_rate(7), 100.0);
    }

    #[test]
    fn sub_scores_match_weighted_terms() {
        assert_eq!(attendance_score(80.0), 20);
        assert_eq!(task_completion_score(60.0), 21);
        assert_eq!(projects_completed_score(2), 5);
        assert_eq!(data_entry_score(3), 2);
    }

    #[test]
    fn count_mentions_full_name_flexible_whitespace() {
        assert_eq!(count_mentions("done by @Sachin Kumar today", "Sachin Kumar"), 1);
        assert_eq!(count_mentions("@sachinkumar finished wiring", "Sachin Kumar"), 1);
        assert_eq!(
            count_mentions("@Sachin Kumar and again @sachin kumar", "Sachin Kumar"),
            2
        );
    }

    #[test]
    fn count_mentions_first_name_fallback() {
        assert_eq!(count_mentions("ping @sachin about the jig", "Sachin Kumar"), 1);
    }

    #[test]
    fn count_mentions_no_match() {
        assert_eq!(count_mentions("no tags here", "Sachin Kumar"), 0);
        assert_eq!(count_mentions("@prakash did this", "Sachin Kumar"), 0);
    }
}
