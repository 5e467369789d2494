/// Simple Moving Average. Element `i` covers `data[i..i + period]`.
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    let mut window: f64 = data[..period].iter().sum();
    result.push(window / period as f64);
    for i in period..data.len() {
        window += data[i] - data[i - period];
        result.push(window / period as f64);
    }
    result
}

/// SMA padded to `data.len()`: `None` until a full window exists
pub fn sma_aligned(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let values = sma(data, period);
    if values.is_empty() {
        return vec![None; data.len()];
    }
    let mut result = vec![None; period - 1];
    result.extend(values.into_iter().map(Some));
    result
}

/// Exponential Moving Average seeded with the SMA of the first window.
/// Element `i` corresponds to `data[i + period - 1]`.
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len() - period + 1);
    let mut prev = data[..period].iter().sum::<f64>() / period as f64;
    result.push(prev);

    for &value in &data[period..] {
        prev = (value - prev) * multiplier + prev;
        result.push(prev);
    }
    result
}

/// Relative Strength Index with Wilder smoothing.
/// Element `i` corresponds to `data[i + period]`.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let changes: Vec<f64> = data.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |c: f64| c.max(0.0);
    let loss = |c: f64| (-c).max(0.0);

    let mut avg_gain = changes[..period].iter().map(|&c| gain(c)).sum::<f64>() / period as f64;
    let mut avg_loss = changes[..period].iter().map(|&c| loss(c)).sum::<f64>() / period as f64;

    let mut values = Vec::with_capacity(changes.len() - period + 1);
    values.push(rsi_from_averages(avg_gain, avg_loss));

    for &change in &changes[period..] {
        avg_gain = (avg_gain * (period - 1) as f64 + gain(change)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + loss(change)) / period as f64;
        values.push(rsi_from_averages(avg_gain, avg_loss));
    }
    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// MACD series, all three aligned so that their last elements share the
/// latest session.
#[derive(Debug, Clone, Default)]
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    if fast_period == 0 || signal_period == 0 || slow_period <= fast_period {
        return MacdResult::default();
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);
    if ema_slow.is_empty() {
        return MacdResult::default();
    }

    let offset = slow_period - fast_period;
    let macd_line: Vec<f64> = ema_slow
        .iter()
        .enumerate()
        .map(|(i, slow)| ema_fast[i + offset] - slow)
        .collect();

    let signal_line = ema(&macd_line, signal_period);
    let hist_offset = macd_line.len() - signal_line.len();
    let histogram = signal_line
        .iter()
        .enumerate()
        .map(|(i, signal)| macd_line[i + hist_offset] - signal)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}
