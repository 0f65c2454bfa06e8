//! Country catalogue loaded into fresh stores.
//!
//! Keep in sync with `migrations/2021-01-01-000001_seed_countries/up.sql`.

/// Country names and populations available for signup.
pub const SEED_COUNTRIES: &[(&str, i64)] = &[
    ("Argentina", 45_195_774),
    ("Australia", 25_499_884),
    ("Brazil", 212_559_417),
    ("Canada", 37_742_154),
    ("Chile", 19_116_201),
    ("Denmark", 5_792_202),
    ("Egypt", 102_334_404),
    ("Finland", 5_540_720),
    ("France", 65_273_511),
    ("Germany", 83_783_942),
    ("Greece", 10_423_054),
    ("India", 1_380_004_385),
    ("Ireland", 4_937_786),
    ("Israel", 8_655_535),
    ("Italy", 60_461_826),
    ("Japan", 126_476_461),
    ("Kenya", 53_771_296),
    ("Mexico", 128_932_753),
    ("Netherlands", 17_134_872),
    ("New Zealand", 4_822_233),
    ("Nigeria", 206_139_589),
    ("Norway", 5_421_241),
    ("Poland", 37_846_611),
    ("Portugal", 10_196_709),
    ("South Africa", 59_308_690),
    ("South Korea", 51_269_185),
    ("Spain", 46_754_778),
    ("Sweden", 10_099_265),
    ("United Kingdom", 67_886_011),
    ("United States", 331_002_651),
];
