use serde::{Deserialize, Serialize};

pub const PRIORITY_KEYS: [&str; 3] = ["p0", "p1", "p2"];

/// A validated `POST /breakdown` body.
///
/// `depth` and `focus_area` hold the text interpolated into the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownRequest {
    pub idea: String,
    pub depth: String,
    pub focus_area: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownResponse {
    pub overview: String,
    pub priorities: Priorities,
    pub system_architecture: SystemArchitecture,
    pub development_steps: Vec<DevelopmentStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Priorities {
    pub p0: PriorityTier,
    pub p1: PriorityTier,
    pub p2: PriorityTier,
}

/// Frontend and backend work for one priority level.
///
/// `Default` is the empty tier used to backfill levels the model left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityTier {
    pub frontend: FrontendPlan,
    pub backend: BackendPlan,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontendPlan {
    pub components: Vec<WorkItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendPlan {
    pub services: Vec<WorkItem>,
    pub data_model: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub name: String,
    pub description: String,
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemArchitecture {
    pub components: Vec<String>,
    pub connections: Vec<String>,
    pub data_flow: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentStep {
    pub phase: String,
    pub tasks: Vec<String>,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
