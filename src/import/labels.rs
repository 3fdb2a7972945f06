//! Human-readable role and status labels used in the source workbook.

use crate::models::{OrderStatus, Role};

const ROLE_LABELS: [(&str, Role); 4] = [
    ("Администратор", Role::Admin),
    ("Менеджер", Role::Manager),
    ("Клиент", Role::Client),
    ("Гость", Role::Guest),
];

const STATUS_LABELS: [(&str, OrderStatus); 4] = [
    ("Завершен", OrderStatus::Completed),
    ("Новый", OrderStatus::New),
    ("В обработке", OrderStatus::InProgress),
    ("Отменен", OrderStatus::Cancelled),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleLabel {
    Known(Role),
    Unmapped(String),
}

impl RoleLabel {
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        ROLE_LABELS
            .iter()
            .find(|(text, _)| *text == label)
            .map(|(_, role)| RoleLabel::Known(*role))
            .unwrap_or_else(|| RoleLabel::Unmapped(label.to_owned()))
    }

    /// Unmapped labels become clients.
    pub fn role(&self) -> Role {
        match self {
            RoleLabel::Known(role) => *role,
            RoleLabel::Unmapped(_) => Role::Client,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLabel {
    Known(OrderStatus),
    Unmapped(String),
}

impl StatusLabel {
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        STATUS_LABELS
            .iter()
            .find(|(text, _)| *text == label)
            .map(|(_, status)| StatusLabel::Known(*status))
            .unwrap_or_else(|| StatusLabel::Unmapped(label.to_owned()))
    }

    /// Unmapped labels become new orders.
    pub fn status(&self) -> OrderStatus {
        match self {
            StatusLabel::Known(status) => *status,
            StatusLabel::Unmapped(_) => OrderStatus::New,
        }
    }
}
