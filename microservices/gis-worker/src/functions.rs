//! Worker functions and their queues

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, WorkerError};
use crate::invocation::parse_message;
use crate::{missions, tickets, Outcome, WorkerContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerFunction {
    CreateMission,
    AddTicket,
    UpdateTicket,
    EditMission,
}

impl WorkerFunction {
    pub const ALL: [WorkerFunction; 4] = [
        WorkerFunction::CreateMission,
        WorkerFunction::AddTicket,
        WorkerFunction::UpdateTicket,
        WorkerFunction::EditMission,
    ];

    /// Function name, also the route the Functions host invokes
    pub fn name(self) -> &'static str {
        match self {
            Self::CreateMission => "create_mission_fs",
            Self::AddTicket => "add_tickets_to_featurelayer",
            Self::UpdateTicket => "update_ticket_in_featurelayer",
            Self::EditMission => "edit_mission_definition",
        }
    }

    pub fn queue(self) -> &'static str {
        match self {
            Self::CreateMission => "adms-gis-new-missions",
            Self::AddTicket => "adms-gis-new-tickets",
            Self::UpdateTicket => "adms-gis-ticket-updates",
            Self::EditMission => "adms-gis-mission-edits",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

impl fmt::Display for WorkerFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Replay kinds accepted on the command line
impl FromStr for WorkerFunction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "missions" => Ok(Self::CreateMission),
            "tickets" => Ok(Self::AddTicket),
            "ticket-updates" => Ok(Self::UpdateTicket),
            "mission-edits" => Ok(Self::EditMission),
            other => Self::from_name(other).ok_or_else(|| {
                format!(
                    "unknown kind '{}', expected missions, tickets, ticket-updates or mission-edits",
                    other
                )
            }),
        }
    }
}

/// Decode `message` for `function` and run it.
pub async fn dispatch(ctx: &WorkerContext, function: WorkerFunction, message: Value) -> Result<Outcome> {
    if !message.is_object() {
        return Err(WorkerError::InvalidMessage(
            "queue message is not a JSON object".to_string(),
        ));
    }

    match function {
        WorkerFunction::CreateMission => {
            missions::create_mission(ctx, &parse_message(message)?).await
        }
        WorkerFunction::AddTicket => tickets::add_ticket(ctx, &parse_message(message)?).await,
        WorkerFunction::UpdateTicket => {
            tickets::update_ticket(ctx, &parse_message(message)?).await
        }
        WorkerFunction::EditMission => missions::edit_mission(ctx, &parse_message(message)?).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for function in WorkerFunction::ALL {
            assert_eq!(WorkerFunction::from_name(function.name()), Some(function));
        }
        assert_eq!(WorkerFunction::from_name("unknown"), None);
    }

    #[test]
    fn test_replay_kinds() {
        assert_eq!("missions".parse::<WorkerFunction>(), Ok(WorkerFunction::CreateMission));
        assert_eq!("ticket-updates".parse::<WorkerFunction>(), Ok(WorkerFunction::UpdateTicket));
        assert_eq!(
            "add_tickets_to_featurelayer".parse::<WorkerFunction>(),
            Ok(WorkerFunction::AddTicket)
        );
        assert!("blobs".parse::<WorkerFunction>().is_err());
    }

    #[test]
    fn test_queue_names() {
        assert_eq!(WorkerFunction::CreateMission.queue(), "adms-gis-new-missions");
        assert_eq!(WorkerFunction::AddTicket.queue(), "adms-gis-new-tickets");
    }
}
