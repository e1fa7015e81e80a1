use chrono::{DateTime, Utc};

/// Coarse relative time such as `5 minutes ago` or `in 2 hours`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let seconds = elapsed.num_seconds();
    if seconds.abs() < 60 {
        return "just now".to_owned();
    }
    let (amount, unit) = [
        (60 * 60 * 24 * 365, "year"),
        (60 * 60 * 24 * 30, "month"),
        (60 * 60 * 24 * 7, "week"),
        (60 * 60 * 24, "day"),
        (60 * 60, "hour"),
        (60, "minute"),
    ]
    .into_iter()
    .find_map(|(size, unit)| {
        let amount = seconds.abs() / size;
        (amount > 0).then_some((amount, unit))
    })
    .unwrap_or((1, "minute"));
    let plural = if amount == 1 { "" } else { "s" };
    if seconds < 0 {
        format!("in {amount} {unit}{plural}")
    } else {
        format!("{amount} {unit}{plural} ago")
    }
}
