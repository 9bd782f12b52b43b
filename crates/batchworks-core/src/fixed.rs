use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits. Used for
/// temperatures, rates, probabilities and progress fractions.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for configuration, never in the tick loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and persisted documents.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// `part / whole` as a fraction. A zero `whole` yields zero rather than
/// dividing by zero.
#[inline]
pub fn fraction(part: u32, whole: u32) -> Fixed64 {
    if whole == 0 {
        return Fixed64::ZERO;
    }
    Fixed64::from_num(part) / Fixed64::from_num(whole)
}

/// Whether `p` is a valid probability in `[0, 1]`.
#[inline]
pub fn is_probability(p: Fixed64) -> bool {
    p >= Fixed64::ZERO && p <= Fixed64::ONE
}
