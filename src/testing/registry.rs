//! Test class registry
//!
//! A fixed catalog of the classes a suite directory may name. Lookup is by
//! case-insensitive name; each class knows its endpoint, response format,
//! row preparation and declared checks.

use std::fmt;
use std::str::FromStr;

use crate::common::Error;
use crate::http::ResponseFormat;

use super::case::{CheckDef, CheckResult, TestCase};
use super::checks::{self, bike_rental, otp_version, planner};
use super::context::RunSettings;
use super::row::ParameterRow;

/// Known test classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TestClass {
    OtpVersion,
    UsfPlanner,
    UsfBikeRental,
}

/// Static description of a test class
#[derive(Debug)]
pub struct ClassInfo {
    pub class: TestClass,
    /// Display name, as used for suite directories and `req_` markers
    pub name: &'static str,
    /// Lookup key
    pub key: &'static str,
    /// Path below the service base URL
    pub endpoint: &'static str,
    pub format: ResponseFormat,
    pub description: &'static str,
    /// Declared checks, in run order
    pub checks: &'static [CheckDef],
}

static OTP_VERSION: ClassInfo = ClassInfo {
    class: TestClass::OtpVersion,
    name: "OTPVersion",
    key: "otpversion",
    endpoint: otp_version::ENDPOINT,
    format: ResponseFormat::Json,
    description: "Server info endpoint reports the expected version",
    checks: otp_version::CHECKS,
};

static USF_PLANNER: ClassInfo = ClassInfo {
    class: TestClass::UsfPlanner,
    name: "USFPlanner",
    key: "usfplanner",
    endpoint: planner::ENDPOINT,
    format: ResponseFormat::Xml,
    description: "Trip planner itineraries match expectations",
    checks: planner::CHECKS,
};

static USF_BIKE_RENTAL: ClassInfo = ClassInfo {
    class: TestClass::UsfBikeRental,
    name: "USFBikeRental",
    key: "usfbikerental",
    endpoint: bike_rental::ENDPOINT,
    format: ResponseFormat::Json,
    description: "Bike rental endpoint lists stations",
    checks: bike_rental::CHECKS,
};

/// All registered classes
static CLASSES: [&ClassInfo; 3] = [&OTP_VERSION, &USF_PLANNER, &USF_BIKE_RENTAL];

/// Get all registered classes
pub fn all_classes() -> impl Iterator<Item = &'static ClassInfo> {
    CLASSES.iter().copied()
}

/// Resolve a class name, ignoring case
pub fn resolve(name: &str) -> Option<TestClass> {
    let key = name.trim().to_ascii_lowercase();
    CLASSES.iter().find(|info| info.key == key).map(|info| info.class)
}

impl TestClass {
    pub fn info(self) -> &'static ClassInfo {
        match self {
            TestClass::OtpVersion => &OTP_VERSION,
            TestClass::UsfPlanner => &USF_PLANNER,
            TestClass::UsfBikeRental => &USF_BIKE_RENTAL,
        }
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn format(self) -> ResponseFormat {
        self.info().format
    }

    pub fn checks(self) -> &'static [CheckDef] {
        self.info().checks
    }

    /// Look up a declared check by exact name
    pub fn check(self, name: &str) -> Option<&'static CheckDef> {
        self.checks().iter().find(|c| c.name == name)
    }

    /// Build a case for `check_name` with its own copy of `row`
    pub fn construct(self, check_name: &str, row: &ParameterRow, gated: bool) -> Option<TestCase> {
        self.check(check_name)
            .map(|check| TestCase::new(self, check, row, gated))
    }

    /// Class-specific row completion, run on a case's private row
    pub fn prepare(self, row: &mut ParameterRow, settings: &RunSettings) -> CheckResult {
        match self {
            TestClass::UsfPlanner => planner::prepare(row, settings),
            TestClass::OtpVersion | TestClass::UsfBikeRental => Ok(()),
        }
    }

    /// Fully-qualified request URL for a prepared row
    pub fn request_url(
        self,
        row: &ParameterRow,
        settings: &RunSettings,
    ) -> Result<String, super::case::CheckError> {
        checks::build_url(self.info().endpoint, row, settings)
    }
}

impl fmt::Display for TestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for TestClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        resolve(s).ok_or_else(|| Error::UnknownClass(s.to_string()))
    }
}
