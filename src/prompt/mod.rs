//! Bulletin requests and prompt assembly
//!
//! A request carries what the user typed; the weather sample carries the
//! series fetched for the requested city. Both are rendered into one of
//! the embedded templates.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::WeatherSample;
use crate::{CityScienceError, Result};

pub mod template;

pub use template::{BUILD_REPORT, CITIZEN_BULLETIN, MANAGEMENT_BULLETIN, PromptTemplate};

/// Citizen question about a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitizenRequest {
    pub city: String,
    pub question: String,
    pub observations: Option<String>,
}

/// Sustainable construction (LEED) report request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub city: String,
    pub project_type: ProjectType,
    pub leed_goal: LeedGoal,
    pub focus_area: FocusArea,
    pub project_details: String,
}

/// Municipal management bulletin request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagementRequest {
    pub city: String,
    pub problem: String,
    pub goal: String,
    pub budget: String,
    pub timeframe: String,
    pub priority: String,
    pub expected_impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BulletinRequest {
    Citizen(CitizenRequest),
    Build(BuildRequest),
    Management(ManagementRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectType {
    #[serde(rename = "BDC")]
    NewConstruction,
    #[serde(rename = "IDCL")]
    Interiors,
    #[serde(rename = "OML")]
    OperationsMaintenance,
    #[serde(rename = "HDC")]
    Homes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeedGoal {
    Certified,
    Silver,
    Gold,
    Platinum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusArea {
    Energy,
    Water,
    Materials,
    Location,
    Indoor,
}

impl ProjectType {
    pub const ALL: [Self; 4] = [
        Self::NewConstruction,
        Self::Interiors,
        Self::OperationsMaintenance,
        Self::Homes,
    ];

    /// Form value
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::NewConstruction => "BDC",
            Self::Interiors => "IDCL",
            Self::OperationsMaintenance => "OML",
            Self::Homes => "HDC",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NewConstruction => "New Construction",
            Self::Interiors => "Interior Design and Construction",
            Self::OperationsMaintenance => "Operations and Maintenance",
            Self::Homes => "Homes Design and Construction",
        }
    }
}

impl LeedGoal {
    pub const ALL: [Self; 4] = [Self::Certified, Self::Silver, Self::Gold, Self::Platinum];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Certified => "Certified",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }
}

impl FocusArea {
    pub const ALL: [Self; 5] = [
        Self::Energy,
        Self::Water,
        Self::Materials,
        Self::Location,
        Self::Indoor,
    ];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Water => "Water",
            Self::Materials => "Materials",
            Self::Location => "Location",
            Self::Indoor => "Indoor",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Energy => "Energy Efficiency (e.g. HVAC, lighting)",
            Self::Water => "Rational Water Use (e.g. rainwater harvesting, landscaping)",
            Self::Materials => "Materials and Resources (e.g. low carbon, regional)",
            Self::Location => "Location and Transportation (e.g. density, access)",
            Self::Indoor => "Indoor Environmental Quality (e.g. ventilation, comfort)",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

impl fmt::Display for LeedGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for FocusArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Case-insensitive lookup of a form code
fn parse_code<T: Copy>(value: &str, all: &[T], code: fn(T) -> &'static str, message: &str) -> Result<T> {
    let value = value.trim();
    all.iter()
        .copied()
        .find(|item| code(*item).eq_ignore_ascii_case(value))
        .ok_or_else(|| CityScienceError::validation(message))
}

impl FromStr for ProjectType {
    type Err = CityScienceError;

    fn from_str(s: &str) -> Result<Self> {
        parse_code(s, &Self::ALL, Self::code, "The project type defines the applicable credits.")
    }
}

impl FromStr for LeedGoal {
    type Err = CityScienceError;

    fn from_str(s: &str) -> Result<Self> {
        parse_code(s, &Self::ALL, Self::code, "Choose the ambition level for your project.")
    }
}

impl FromStr for FocusArea {
    type Err = CityScienceError;

    fn from_str(s: &str) -> Result<Self> {
        parse_code(
            s,
            &Self::ALL,
            Self::code,
            "Select the area where cost and impact should be optimized.",
        )
    }
}

pub const BUILD_CITY_REQUIRED: &str =
    "The location is essential for zoning criteria and local resources.";

/// Validation error carrying `message` when `value` is blank
pub fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CityScienceError::validation(message));
    }
    Ok(())
}

impl BulletinRequest {
    /// City whose weather feeds the prompt
    #[must_use]
    pub fn city(&self) -> &str {
        match self {
            Self::Citizen(r) => &r.city,
            Self::Build(r) => &r.city,
            Self::Management(r) => &r.city,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Citizen(_) => "citizen",
            Self::Build(_) => "build",
            Self::Management(_) => "management",
        }
    }

    #[must_use]
    pub fn template(&self) -> &'static PromptTemplate {
        match self {
            Self::Citizen(_) => &CITIZEN_BULLETIN,
            Self::Build(_) => &BUILD_REPORT,
            Self::Management(_) => &MANAGEMENT_BULLETIN,
        }
    }

    /// Check required fields; the first missing one is reported
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Citizen(r) => {
                require(&r.city, "City/State: this field is required.")?;
                require(&r.question, "Question: this field is required.")
            }
            Self::Build(r) => {
                require(&r.city, BUILD_CITY_REQUIRED)?;
                require(
                    &r.project_details,
                    "Provide details such as budget, current phase and main obstacles.",
                )
            }
            Self::Management(r) => {
                for (value, field) in [
                    (&r.city, "City"),
                    (&r.problem, "Main problem"),
                    (&r.goal, "Goal"),
                    (&r.budget, "Budget"),
                    (&r.timeframe, "Timeframe"),
                    (&r.priority, "Priority"),
                    (&r.expected_impact, "Expected impact"),
                ] {
                    require(value, &format!("{field}: this field is required."))?;
                }
                Ok(())
            }
        }
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Citizen(r) => vec![
                ("location", r.city.clone()),
                ("question", r.question.clone()),
                ("observations", r.observations.clone().unwrap_or_default()),
            ],
            Self::Build(r) => vec![
                ("city", r.city.clone()),
                ("project_type", r.project_type.to_string()),
                ("leed_goal", r.leed_goal.to_string()),
                ("focus_area", r.focus_area.to_string()),
                ("project_details", r.project_details.clone()),
            ],
            Self::Management(r) => vec![
                ("city", r.city.clone()),
                ("problem", r.problem.clone()),
                ("goal", r.goal.clone()),
                ("budget", r.budget.clone()),
                ("timeframe", r.timeframe.clone()),
                ("priority", r.priority.clone()),
                ("expected_impact", r.expected_impact.clone()),
            ],
        }
    }
}

/// Render the instruction for `request` with the weather series as JSON arrays
pub fn build_prompt(request: &BulletinRequest, sample: &WeatherSample) -> Result<String> {
    let mut values: BTreeMap<&str, String> = request.fields().into_iter().collect();
    values.insert("temperatures", serde_json::to_string(&sample.temperatures)?);
    values.insert("humidity", serde_json::to_string(&sample.humidity)?);
    values.insert("wind", serde_json::to_string(&sample.wind)?);
    values.insert("clouds", serde_json::to_string(&sample.cloud_cover)?);
    values.insert("uv", serde_json::to_string(&sample.uv)?);
    values.insert("labels", serde_json::to_string(&sample.labels())?);

    request.template().render(&values)
}
