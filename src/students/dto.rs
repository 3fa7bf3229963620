use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AddStudentForm {
    pub roll_no: String,
    pub name: String,
    pub student_class: String,
}

#[derive(Debug, Deserialize)]
pub struct EditStudentForm {
    pub name: String,
    pub student_class: String,
}

/// Outcome of an edit, reported back to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Updated,
    Unchanged,
}
