// The people sheet behind Form A: column B names the person, later columns hold
// the details that end up on the generated presentation.

use super::ports::{SpreadsheetReader, WorkspaceError};
use std::sync::Arc;

const NAME_COLUMN: usize = 1;
const POSITION_COLUMN: usize = 5;
const PHONE_COLUMN: usize = 6;
const EMAIL_COLUMN: usize = 7;
const DESCRIPTION_COLUMN: usize = 8;
const PHOTO_COLUMN: usize = 9;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonRecord {
    pub name: String,
    pub position: String,
    pub phone: String,
    pub email: String,
    pub description: String,
    pub photo_url: String,
}

impl PersonRecord {
    pub fn from_row(row: &[String]) -> Self {
        let cell = |i: usize| row.get(i).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            name: cell(NAME_COLUMN),
            position: cell(POSITION_COLUMN),
            phone: cell(PHONE_COLUMN),
            email: cell(EMAIL_COLUMN),
            description: cell(DESCRIPTION_COLUMN),
            photo_url: cell(PHOTO_COLUMN),
        }
    }

    /// Placeholder keys this record contributes to a template.
    pub fn placeholders(&self) -> Vec<(String, String)> {
        vec![
            ("person_name".to_string(), self.name.clone()),
            ("person_position".to_string(), self.position.clone()),
            ("person_phone".to_string(), self.phone.clone()),
            ("person_email".to_string(), self.email.clone()),
            ("person_description".to_string(), self.description.clone()),
            ("person_photo_url".to_string(), self.photo_url.clone()),
        ]
    }
}

pub struct PeopleDirectory {
    sheets: Arc<dyn SpreadsheetReader>,
    sheet_id: String,
    range: String,
}

impl PeopleDirectory {
    pub fn new(sheets: Arc<dyn SpreadsheetReader>, sheet_id: String, range: String) -> Self {
        Self {
            sheets,
            sheet_id,
            range,
        }
    }

    /// Every row that has a name, in sheet order.
    pub async fn list(&self) -> Result<Vec<PersonRecord>, WorkspaceError> {
        let rows = self.sheets.read_range(&self.sheet_id, &self.range).await?;
        Ok(rows
            .iter()
            .map(|row| PersonRecord::from_row(row))
            .filter(|person| !person.name.is_empty())
            .collect())
    }

    pub async fn find(&self, name: &str) -> Result<Option<PersonRecord>, WorkspaceError> {
        if name.is_empty() {
            return Ok(None);
        }
        Ok(self.list().await?.into_iter().find(|p| p.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::FakeSheet;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn short_rows_leave_details_blank() {
        let person = PersonRecord::from_row(&row(&["1", "Anna"]));
        assert_eq!(person.name, "Anna");
        assert_eq!(person.phone, "");
        assert_eq!(person.photo_url, "");
    }

    #[tokio::test]
    async fn list_skips_rows_without_a_name() {
        let sheet = FakeSheet::with_rows(vec![
            row(&["1", "Anna", "", "", "", "Consultant", "123", "anna@x.io", "Bio", "http://p"]),
            row(&["2", ""]),
            row(&["3", "Piotr"]),
        ]);
        let directory = PeopleDirectory::new(Arc::new(sheet), "sheet".into(), "A2:J".into());

        let people = directory.list().await.unwrap();

        assert_eq!(people.len(), 2);
        assert_eq!(people[0].position, "Consultant");
        assert_eq!(people[0].email, "anna@x.io");
        assert_eq!(people[1].name, "Piotr");
    }

    #[tokio::test]
    async fn find_matches_exact_name() {
        let sheet = FakeSheet::with_rows(vec![row(&["1", "Anna"]), row(&["2", "Annabel"])]);
        let directory = PeopleDirectory::new(Arc::new(sheet), "sheet".into(), "A2:J".into());

        let found = directory.find("Annabel").await.unwrap();

        assert_eq!(found.map(|p| p.name), Some("Annabel".to_string()));
        assert_eq!(directory.find("").await.unwrap(), None);
    }
}
