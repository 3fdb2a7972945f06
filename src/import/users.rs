use super::labels::RoleLabel;
use super::sheet::{SheetRow, USER_SHEET};
use super::{Decoded, ImportError, Importer, RowSkip, Stage, StageReport, Workbook};
use crate::insertables::{NewAccount, NewProfile};
use crate::password::hash_password;
use crate::store::{Entity, Store};

const ROLE: usize = 0;
const FULL_NAME: usize = 1;
const EMAIL: usize = 2;
const PASSWORD: usize = 3;

const EMAIL_MAX_CHARS: usize = 254;
const FULL_NAME_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub line: usize,
    pub role: RoleLabel,
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl UserRow {
    pub fn decode(row: &SheetRow<'_>) -> Result<Decoded<Self>, ImportError> {
        let email = row.bounded_text(EMAIL, "email", EMAIL_MAX_CHARS)?;
        if email.is_empty() {
            return Ok(Decoded::Skip(RowSkip::EmptyKey("email")));
        }
        Ok(Decoded::Row(Self {
            line: row.line,
            role: RoleLabel::parse(&row.text(ROLE)),
            full_name: row.bounded_text(FULL_NAME, "full_name", FULL_NAME_MAX_CHARS)?,
            email,
            password: row.text(PASSWORD),
        }))
    }
}

/// Local part of `email` when its domain is one of `allowed_domains`.
pub fn username_from_email(email: &str, allowed_domains: &[String]) -> Result<String, RowSkip> {
    let foreign = || RowSkip::ForeignDomain(email.to_owned());
    let (local, domain) = email.trim().rsplit_once('@').ok_or_else(foreign)?;
    let domain = domain.to_lowercase();
    if local.is_empty() || !allowed_domains.iter().any(|allowed| *allowed == domain) {
        return Err(foreign());
    }
    Ok(local.to_owned())
}

/// `(first_name, last_name)`: the first token is the surname, the second the given name.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut tokens = full_name.split_whitespace();
    let last_name = tokens.next().unwrap_or_default().to_owned();
    let first_name = tokens.next().unwrap_or_default().to_owned();
    (first_name, last_name)
}

impl<S: Store> Importer<'_, S> {
    pub fn import_users(&mut self, workbook: &Workbook) -> Result<StageReport, ImportError> {
        let mut report = StageReport::new(Stage::Users);
        for row in workbook.data_rows(USER_SHEET)? {
            report.rows += 1;
            match UserRow::decode(&row)? {
                Decoded::Row(user) => self.load_user(&user, &mut report)?,
                Decoded::Skip(reason) => report.skip(USER_SHEET, row.line, reason),
            }
        }
        self.finish(report, Entity::Account)
    }

    /// Creates the account on first sight; an existing account keeps its
    /// credential. The profile is created once and never rewritten.
    pub fn load_user(&mut self, row: &UserRow, report: &mut StageReport) -> Result<(), ImportError> {
        let username = match username_from_email(&row.email, &self.email_domains) {
            Ok(username) => username,
            Err(reason) => {
                report.skip(USER_SHEET, row.line, reason);
                return Ok(());
            }
        };

        let account = match self.store.account_by_username(&username)? {
            Some(account) => {
                report.record(false);
                account
            }
            None => {
                let (first_name, last_name) = split_full_name(&row.full_name);
                let password_hash = if row.password.is_empty() {
                    None
                } else {
                    Some(hash_password(&row.password)?)
                };
                let account = self.store.create_account(&NewAccount {
                    username,
                    email: row.email.clone(),
                    first_name,
                    last_name,
                    password_hash,
                })?;
                report.record(true);
                account
            }
        };

        if let RoleLabel::Unmapped(label) = &row.role {
            report.warn(format_args!(
                "{USER_SHEET} row {}: unknown role `{label}`, using {}",
                row.line,
                row.role.role()
            ));
        }
        self.store
            .get_or_create_profile(&NewProfile::new(account.id, row.role.role(), &row.full_name))?;
        Ok(())
    }
}
