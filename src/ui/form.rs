use crate::calc::validator::{ValidationError, validate};
use crate::data::StepLedger;
use log::{debug, info, trace};

pub const DATE_LABEL: &str = "Дата (ДД.ММ.ГГГГ)";
pub const DISTANCE_LABEL: &str = "Пройдено км";
pub const DATE_PLACEHOLDER: &str = "01.01.2000";
pub const SUBMIT_LABEL: &str = "ОК";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Date,
    Distance,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Distance => "distance",
        }
    }
}

/// What happened to a single submit attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Ledger updated; carries the date key and its new total.
    Recorded { key: String, total: f64 },
    /// Rejected with a message the user must see.
    Alert(ValidationError),
    /// Rejected without telling the user.
    Ignored,
}

/// The two raw text fields of the entry form.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StepForm {
    pub date: String,
    pub distance: String,
}

impl StepForm {
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Date => &self.date,
            Field::Distance => &self.distance,
        }
    }

    pub fn value_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Date => &mut self.date,
            Field::Distance => &mut self.distance,
        }
    }

    /// Replaces one field, leaving the other untouched.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        trace!("{} = {:?}", field.name(), value);
        *self.value_mut(field) = value;
    }

    pub fn clear(&mut self) {
        self.date.clear();
        self.distance.clear();
    }

    /// Validates the fields and, on success, records them and clears the form.
    /// On any failure the fields and the ledger are left as they were.
    pub fn submit(&mut self, ledger: &mut StepLedger) -> SubmitOutcome {
        match validate(&self.date, &self.distance) {
            Ok(submission) => {
                let entry = ledger.upsert(submission.date, submission.distance);
                debug!(
                    "recorded {} km for {} (total {})",
                    submission.distance, entry.key, entry.distance
                );
                let outcome = SubmitOutcome::Recorded {
                    key: entry.key.clone(),
                    total: entry.distance,
                };
                self.clear();
                outcome
            }
            Err(e) if e.is_silent() => {
                debug!("ignoring submission with distance {:?}", self.distance);
                SubmitOutcome::Ignored
            }
            Err(e) => {
                info!("rejected date {:?}: {:?}", self.date, e);
                SubmitOutcome::Alert(e)
            }
        }
    }
}
