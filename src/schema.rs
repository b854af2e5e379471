/// Column-name constants for the covid-explorer dataset.
/// Single source of truth - shared by the loader, the query engine and the
/// Python bindings.

// ── Record identity columns ─────────────────────────────────────────────────
pub mod record {
    pub const LOCATION: &str = "location";
    pub const ISO_CODE: &str = "iso_code";
    pub const DATE: &str = "date";
}

// ── Metric columns ──────────────────────────────────────────────────────────
pub mod metric {
    pub const TOTAL_CASES: &str = "total_cases";
    pub const NEW_CASES: &str = "new_cases";
    pub const TOTAL_CASES_PER_MILLION: &str = "total_cases_per_million";
    pub const NEW_CASES_PER_MILLION: &str = "new_cases_per_million";
    pub const TOTAL_DEATHS: &str = "total_deaths";
    pub const NEW_DEATHS: &str = "new_deaths";
    pub const TOTAL_DEATHS_PER_MILLION: &str = "total_deaths_per_million";
    pub const NEW_DEATHS_PER_MILLION: &str = "new_deaths_per_million";
    pub const PEOPLE_FULLY_VACCINATED: &str = "people_fully_vaccinated";
    pub const NEW_VACCINATIONS: &str = "new_vaccinations";
    pub const ICU_PATIENTS_PER_MILLION: &str = "icu_patients_per_million";
    pub const HOSP_PATIENTS_PER_MILLION: &str = "hosp_patients_per_million";

    pub const ALL: [&str; 12] = [
        TOTAL_CASES,
        NEW_CASES,
        TOTAL_CASES_PER_MILLION,
        NEW_CASES_PER_MILLION,
        TOTAL_DEATHS,
        NEW_DEATHS,
        TOTAL_DEATHS_PER_MILLION,
        NEW_DEATHS_PER_MILLION,
        PEOPLE_FULLY_VACCINATED,
        NEW_VACCINATIONS,
        ICU_PATIENTS_PER_MILLION,
        HOSP_PATIENTS_PER_MILLION,
    ];
}

// ── Derived columns ─────────────────────────────────────────────────────────
pub mod derived {
    pub const ROLLING_MEAN: &str = "rolling_mean";
    pub const SCALED_VALUE: &str = "scaled_value";
}

// ── Date formats ────────────────────────────────────────────────────────────
pub mod format {
    /// Input and display format of calendar dates.
    pub const DATE: &str = "%Y-%m-%d";
    /// Range-control tick labels.
    pub const TICK: &str = "%y/%m";
}

// ── Selectable indicators ───────────────────────────────────────────────────

/// An indicator the map and the comparative line plot can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Indicator {
    pub field: &'static str,
    pub label: &'static str,
}

pub const INDICATORS: [Indicator; 8] = [
    Indicator {
        field: metric::TOTAL_CASES,
        label: "Total confirmed cases",
    },
    Indicator {
        field: metric::TOTAL_CASES_PER_MILLION,
        label: "Total confirmed cases per million people",
    },
    Indicator {
        field: metric::NEW_CASES,
        label: "Daily confirmed cases",
    },
    Indicator {
        field: metric::NEW_CASES_PER_MILLION,
        label: "Daily confirmed cases per million people",
    },
    Indicator {
        field: metric::TOTAL_DEATHS,
        label: "Total deaths",
    },
    Indicator {
        field: metric::TOTAL_DEATHS_PER_MILLION,
        label: "Total deaths per million people",
    },
    Indicator {
        field: metric::NEW_DEATHS,
        label: "Daily deaths",
    },
    Indicator {
        field: metric::NEW_DEATHS_PER_MILLION,
        label: "Daily deaths per million people",
    },
];

/// Display label of a selectable indicator.
pub fn indicator_label(field: &str) -> Option<&'static str> {
    INDICATORS
        .iter()
        .find(|ind| ind.field == field)
        .map(|ind| ind.label)
}
