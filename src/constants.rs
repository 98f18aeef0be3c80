/// Source name constants to ensure consistency across the codebase
/// These are the user-facing names accepted by the CLI and used as `source_id` in errors and logs
pub const NATIONAL_SOURCE: &str = "national";
pub const REGIONAL_SOURCE: &str = "regional";
pub const SEVERE_SOURCE: &str = "severe";

/// Region label of the country-wide aggregate (single-region feeds and the synthetic regional sum)
pub const AGGREGATE_REGION: &str = "Israel";

// Shared raw column
pub const DATE_COLUMN: &str = "Date";

// National daily feed
pub const NATIONAL_POSITIVE_COLUMN: &str = "New infected";
pub const NATIONAL_TOTAL_COLUMN: &str = "Tests for identification";
// The published CSV header carries this misspelling
pub const NATIONAL_TOTAL_COLUMN_LEGACY: &str = "Tests for idenitifaction";
pub const NATIONAL_DEATHS_COLUMN: &str = "New deaths";

// Per-city cumulative datastore
pub const REGIONAL_REGION_COLUMN: &str = "City_Code";
pub const REGIONAL_POSITIVE_COLUMN: &str = "Cumulative_verified_cases";
pub const REGIONAL_DEATHS_COLUMN: &str = "Cumulated_deaths";
pub const REGIONAL_TOTAL_COLUMN: &str = "Cumulated_number_of_diagnostic_tests";

// Severe-case feed
pub const SEVERE_POSITIVE_COLUMN: &str = "severe_new";

/// Date format used by every feed
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Get all supported source names
pub fn get_supported_sources() -> Vec<&'static str> {
    vec![NATIONAL_SOURCE, REGIONAL_SOURCE, SEVERE_SOURCE]
}
