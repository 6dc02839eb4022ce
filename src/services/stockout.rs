/// Days until `current_stock` runs out at the average daily velocity
/// `total_sold / window_days`, rounded up.
///
/// Returns `None` when the velocity is not positive.
pub fn days_until_stockout(current_stock: i32, total_sold: i64, window_days: u32) -> Option<i64> {
    if total_sold <= 0 || window_days == 0 {
        return None;
    }

    // ceil(stock / (sold / days)) == ceil(stock * days / sold), kept in integers
    let numerator = i64::from(current_stock).checked_mul(i64::from(window_days))?;
    Some(ceil_div(numerator, total_sold))
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    if numerator % denominator != 0 && (numerator > 0) == (denominator > 0) {
        quotient + 1
    } else {
        quotient
    }
}
