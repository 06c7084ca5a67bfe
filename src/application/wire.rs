//! JSON shapes exchanged with the hierarchy endpoints.
//!
//! Fetch returns either a plain array of rows or an object keyed by division.
//! Persist bodies come in a supervisor flavour (by id) and a division flavour
//! (by name). Both resolve to a [`Reassignment`] against the current forest.

use serde::{Deserialize, Serialize};

use crate::domain::{
    Division, DomainError, DomainResult, EmployeeId, FlatRow, Forest, ParentRef, PersonName,
    Reassignment,
};

/// Fetch payload for the flat relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HierarchyPayload {
    Rows(Vec<FlatRow>),
    Divisions(DivisionRows),
}

/// The division-keyed payload shape. Only the known division keys are
/// accepted, and at least one of them has to be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DivisionKeys")]
pub struct DivisionRows {
    pub global: Vec<FlatRow>,
    pub domestic: Vec<FlatRow>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DivisionKeys {
    global: Option<Vec<FlatRow>>,
    domestic: Option<Vec<FlatRow>>,
}

impl TryFrom<DivisionKeys> for DivisionRows {
    type Error = String;

    fn try_from(keys: DivisionKeys) -> Result<Self, Self::Error> {
        match (keys.global, keys.domestic) {
            (None, None) => Err(format!(
                "division payload needs a {:?} or {:?} key",
                Division::Global.as_str(),
                Division::Domestic.as_str()
            )),
            (global, domestic) => Ok(DivisionRows {
                global: global.unwrap_or_default(),
                domestic: domestic.unwrap_or_default(),
            }),
        }
    }
}

impl HierarchyPayload {
    /// Parse a fetch body. Picks the shape from the top-level JSON type so a
    /// malformed division object reports its own error.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        if value.is_object() {
            serde_json::from_value(value).map(HierarchyPayload::Divisions)
        } else {
            serde_json::from_value(value).map(HierarchyPayload::Rows)
        }
    }

    /// All rows; in the division shape each row takes the division of its key.
    pub fn into_rows(self) -> Vec<FlatRow> {
        match self {
            HierarchyPayload::Rows(rows) => rows,
            HierarchyPayload::Divisions(DivisionRows { global, domestic }) => {
                let tag = |division: Division| {
                    move |mut row: FlatRow| {
                        row.division = Some(division);
                        row
                    }
                };
                global
                    .into_iter()
                    .map(tag(Division::Global))
                    .chain(domestic.into_iter().map(tag(Division::Domestic)))
                    .collect()
            }
        }
    }

    pub fn is_divided(&self) -> bool {
        matches!(self, HierarchyPayload::Divisions(_))
    }

    /// Group `rows` by division. Rows without a division are rejected.
    pub fn divided(rows: Vec<FlatRow>) -> DomainResult<Self> {
        let mut divisions = DivisionRows::default();
        for row in rows {
            match row.division {
                Some(Division::Global) => divisions.global.push(row),
                Some(Division::Domestic) => divisions.domestic.push(row),
                None => {
                    return Err(DomainError::MalformedRow {
                        id: row.id,
                        message: "row has no division".to_string(),
                    })
                }
            }
        }
        Ok(HierarchyPayload::Divisions(divisions))
    }
}

/// Supervisor re-parenting body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorChange {
    pub employee_id: EmployeeId,
    #[serde(default)]
    pub new_supervisor_id: Option<EmployeeId>,
    #[serde(default)]
    pub new_supervisor_first_name: Option<String>,
    #[serde(default)]
    pub new_supervisor_last_name: Option<String>,
}

impl SupervisorChange {
    pub fn to_reassignment(&self) -> DomainResult<Reassignment> {
        let supervisor = match self.new_supervisor_id {
            Some(id) => ParentRef::Id(id),
            None => name_pair(
                self.new_supervisor_first_name.as_deref(),
                self.new_supervisor_last_name.as_deref(),
            )
            .map(ParentRef::Name)
            .ok_or_else(|| DomainError::MalformedRow {
                id: self.employee_id,
                message: "reassignment names no new supervisor".to_string(),
            })?,
        };
        Ok(Reassignment::Supervisor {
            employee: self.employee_id,
            supervisor,
        })
    }
}

/// Division reassignment body. The dragged employee is identified by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionChange {
    pub dragged_first_name: String,
    pub dragged_last_name: String,
    pub target_division: String,
    #[serde(default)]
    pub target_first_name: Option<String>,
    #[serde(default)]
    pub target_last_name: Option<String>,
}

impl DivisionChange {
    pub fn to_reassignment(&self, forest: &Forest) -> DomainResult<Reassignment> {
        let employee =
            forest.resolve_name(&PersonName::new(&self.dragged_first_name, &self.dragged_last_name))?;
        let division = self.target_division.parse::<Division>()?;
        let supervisor = name_pair(
            self.target_first_name.as_deref(),
            self.target_last_name.as_deref(),
        )
        .map(ParentRef::Name);
        Ok(Reassignment::Division {
            employee,
            division,
            supervisor,
        })
    }
}

/// Either persist body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PersistRequest {
    Supervisor(SupervisorChange),
    Division(DivisionChange),
}

impl PersistRequest {
    pub fn to_reassignment(&self, forest: &Forest) -> DomainResult<Reassignment> {
        match self {
            PersistRequest::Supervisor(change) => change.to_reassignment(),
            PersistRequest::Division(change) => change.to_reassignment(forest),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PersistResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

fn name_pair(first: Option<&str>, last: Option<&str>) -> Option<PersonName> {
    let first = first.map(str::trim).filter(|s| !s.is_empty())?;
    let last = last.map(str::trim).filter(|s| !s.is_empty())?;
    Some(PersonName::new(first, last))
}
