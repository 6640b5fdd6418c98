mod arbitrary;
mod property_codecs;
mod property_roundtrip;

/// Iterations per property: more on CI, few under miri.
fn iterations() -> u64 {
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}
