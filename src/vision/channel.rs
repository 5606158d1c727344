//! Saturating per-sample channel shifts

/// Add `amount` to every sample, clamping to 0..=255 instead of wrapping.
pub fn shift_channel(channel: &mut [u8], amount: i32) {
    if amount > 0 {
        let amount = amount.min(255) as u8;
        for c in channel.iter_mut() {
            *c = c.saturating_add(amount);
        }
    } else if amount < 0 {
        let amount = amount.unsigned_abs().min(255) as u8;
        for c in channel.iter_mut() {
            *c = c.saturating_sub(amount);
        }
    }
}

/// Single-sample form of [`shift_channel`].
pub fn shift_value(value: u8, amount: i32) -> u8 {
    let mut sample = [value];
    shift_channel(&mut sample, amount);
    sample[0]
}
