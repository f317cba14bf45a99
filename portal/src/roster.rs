//! Roster export.
//!
//! Joins an event's registrations with registrant profiles and serializes
//! them into a single-sheet spreadsheet workbook for download.

use crate::error::PortalError;
use crate::registration::RegistrationService;
use crate::types::{Attendee, EventId};
use rust_xlsxwriter::Workbook;

/// Column headers, in output order.
const HEADERS: [&str; 7] = [
    "Name",
    "Unique ID",
    "Branch",
    "Year",
    "Section",
    "Email",
    "Registered On",
];

/// Literal used for every absent cell.
const ABSENT: &str = "N/A";

/// A generated roster workbook ready for download.
#[derive(Clone, Debug)]
pub struct RosterFile {
    /// Download name, derived from the event title.
    pub filename: String,
    /// Serialized `.xlsx` bytes.
    pub bytes: Vec<u8>,
}

/// Exports an event's roster.
///
/// Returns `Ok(None)` when the event has no registrations — no file is
/// produced and the caller informs the user instead. Otherwise the workbook
/// has one sheet named `Registrations`, the fixed header row, and one row
/// per registration with `"N/A"` standing in for every absent profile field.
///
/// # Errors
///
/// - [`PortalError::Transport`]: a store call failed or the workbook could
///   not be serialized
pub async fn export_roster(
    registrations: &RegistrationService,
    event: &EventId,
    event_title: &str,
) -> Result<Option<RosterFile>, PortalError> {
    let attendees = registrations.list_with_profiles(event).await?;
    if attendees.is_empty() {
        return Ok(None);
    }

    let bytes = build_workbook(&attendees)?;
    Ok(Some(RosterFile {
        filename: format!("{}_Registrations.xlsx", sanitize_title(event_title)),
        bytes,
    }))
}

/// Projects attendees onto the fixed column set, defaulting absent cells.
fn roster_rows(attendees: &[Attendee]) -> Vec<[String; 7]> {
    attendees
        .iter()
        .map(|attendee| {
            let profile = attendee.profile.as_ref();
            let cell = |value: Option<&String>| {
                value.map_or_else(|| ABSENT.to_string(), Clone::clone)
            };
            [
                cell(profile.and_then(|p| p.name.as_ref())),
                cell(profile.and_then(|p| p.unique_id.as_ref())),
                cell(profile.and_then(|p| p.branch.as_ref())),
                cell(profile.and_then(|p| p.year.as_ref())),
                cell(profile.and_then(|p| p.section.as_ref())),
                attendee.email().to_string(),
                attendee
                    .registration
                    .registered_at
                    .format("%Y-%m-%d %H:%M UTC")
                    .to_string(),
            ]
        })
        .collect()
}

fn build_workbook(attendees: &[Attendee]) -> Result<Vec<u8>, PortalError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Registrations")
        .map_err(|err| PortalError::Transport(format!("workbook serialization failed: {err}")))?;

    let write = |sheet: &mut rust_xlsxwriter::Worksheet,
                 row: u32,
                 col: u16,
                 value: &str|
     -> Result<(), PortalError> {
        sheet
            .write_string(row, col, value)
            .map_err(|err| PortalError::Transport(format!("workbook serialization failed: {err}")))?;
        Ok(())
    };

    for (col, header) in HEADERS.iter().enumerate() {
        write(sheet, 0, col_index(col), header)?;
    }
    for (row, cells) in roster_rows(attendees).iter().enumerate() {
        for (col, value) in cells.iter().enumerate() {
            write(sheet, row_index(row), col_index(col), value)?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|err| PortalError::Transport(format!("workbook serialization failed: {err}")))
}

fn col_index(col: usize) -> u16 {
    u16::try_from(col).unwrap_or(u16::MAX)
}

fn row_index(row: usize) -> u32 {
    // Header occupies row 0.
    u32::try_from(row + 1).unwrap_or(u32::MAX)
}

/// Keeps the event title usable as a filename component.
fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "Event".to_string()
    } else {
        cleaned
    }
}
