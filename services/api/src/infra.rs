use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use mealbridge::donations::{
    EnvironmentKind, FoodType, NotificationSink, NotifyError, StorageKind, VolunteerNotification,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Notification sink for the running service: structured log lines
/// stand in for the mail/push transport, which lives outside this
/// deployment.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotificationSink;

impl NotificationSink for LoggingNotificationSink {
    fn notify(&self, notification: VolunteerNotification) -> Result<(), NotifyError> {
        info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "volunteer notification dispatched"
        );
        Ok(())
    }
}

/// Sink used by the CLI demo so dispatched alerts can be printed back.
#[derive(Default, Clone)]
pub(crate) struct RecordingNotificationSink {
    events: Arc<Mutex<Vec<VolunteerNotification>>>,
}

impl RecordingNotificationSink {
    pub(crate) fn events(&self) -> Vec<VolunteerNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, notification: VolunteerNotification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(crate) fn parse_food_type(raw: &str) -> Result<FoodType, String> {
    match raw.trim().to_lowercase().as_str() {
        "cooked_veg" | "cooked-veg" => Ok(FoodType::CookedVeg),
        "non_veg" | "non-veg" => Ok(FoodType::NonVeg),
        "packaged" => Ok(FoodType::Packaged),
        "raw" => Ok(FoodType::Raw),
        other => Err(format!(
            "unknown food type '{other}' (expected cooked_veg, non_veg, packaged, or raw)"
        )),
    }
}

pub(crate) fn parse_storage(raw: &str) -> Result<StorageKind, String> {
    match raw.trim().to_lowercase().as_str() {
        "fridge" => Ok(StorageKind::Fridge),
        "room_temp" | "room-temp" => Ok(StorageKind::RoomTemp),
        other => Err(format!(
            "unknown storage '{other}' (expected fridge or room_temp)"
        )),
    }
}

pub(crate) fn parse_environment(raw: &str) -> Result<EnvironmentKind, String> {
    match raw.trim().to_lowercase().as_str() {
        "dry" => Ok(EnvironmentKind::Dry),
        "humid" => Ok(EnvironmentKind::Humid),
        other => Err(format!("unknown environment '{other}' (expected dry or humid)")),
    }
}
