use serde::Deserialize;
use tracing::info;

use shiperp_core::{new_id, now_rfc3339, ServiceError};

use crate::model::ServiceSetting;
use super::RatesService;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSettingInput {
    pub carrier: String,
    pub service: String,
    pub display_name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i64,
}

fn default_active() -> bool {
    true
}

impl RatesService {
    pub fn create_setting(
        &self,
        input: CreateSettingInput,
    ) -> Result<ServiceSetting, ServiceError> {
        if input.carrier.trim().is_empty() || input.service.trim().is_empty() {
            return Err(ServiceError::Validation(
                "carrier and service must not be empty".into(),
            ));
        }
        if input.display_name.trim().is_empty() {
            return Err(ServiceError::Validation(
                "displayName must not be empty".into(),
            ));
        }

        let now = now_rfc3339();
        let setting = ServiceSetting {
            id: new_id(),
            carrier: input.carrier,
            service: input.service,
            display_name: input.display_name,
            is_active: input.is_active,
            sort_order: input.sort_order,
            created_at: now.clone(),
            updated_at: now,
        };

        self.settings.insert(&setting)?;
        info!(
            "service setting created: {}/{}",
            setting.carrier, setting.service
        );
        Ok(setting)
    }

    pub fn get_setting(&self, id: &str) -> Result<ServiceSetting, ServiceError> {
        self.settings.get(id)
    }

    pub fn list_settings(&self) -> Result<Vec<ServiceSetting>, ServiceError> {
        self.settings.list_all()
    }

    /// Merge-patch a setting. Identity and timestamps are immutable.
    pub fn update_setting(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<ServiceSetting, ServiceError> {
        let current = self.settings.get(id)?;
        let updated: ServiceSetting =
            Self::apply_patch(&current, patch, &["id", "createdAt"])?;

        if updated.carrier.trim().is_empty() || updated.service.trim().is_empty() {
            return Err(ServiceError::Validation(
                "carrier and service must not be empty".into(),
            ));
        }

        self.settings.update(&updated)?;
        Ok(updated)
    }

    pub fn delete_setting(&self, id: &str) -> Result<(), ServiceError> {
        self.settings.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shiperp_sql::{SQLStore, SqliteStore};

    use crate::duty::Unavailable;
    use crate::service::{RatesConfig, RatesService};
    use super::*;

    fn service() -> RatesService {
        let db: Arc<dyn SQLStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        RatesService::new(db, Arc::new(Unavailable), RatesConfig::default()).unwrap()
    }

    fn input(carrier: &str, service: &str) -> CreateSettingInput {
        CreateSettingInput {
            carrier: carrier.into(),
            service: service.into(),
            display_name: format!("{carrier} {service}"),
            is_active: true,
            sort_order: 0,
        }
    }

    #[test]
    fn create_and_list() {
        let svc = service();
        svc.create_setting(input("DHL", "Express")).unwrap();
        svc.create_setting(input("UPS", "Ground")).unwrap();

        assert_eq!(svc.list_settings().unwrap().len(), 2);
    }

    #[test]
    fn duplicate_pair_is_conflict() {
        let svc = service();
        svc.create_setting(input("DHL", "Express")).unwrap();
        let err = svc.create_setting(input("DHL", "Express")).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn patch_toggles_visibility() {
        let svc = service();
        let setting = svc.create_setting(input("DHL", "Express")).unwrap();

        let updated = svc
            .update_setting(
                &setting.id,
                serde_json::json!({"isActive": false, "sortOrder": 5}),
            )
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.sort_order, 5);

        // Identity is immutable through patches.
        let updated = svc
            .update_setting(&setting.id, serde_json::json!({"id": "hijack"}))
            .unwrap();
        assert_eq!(updated.id, setting.id);
    }

    #[test]
    fn empty_display_name_rejected() {
        let svc = service();
        let mut bad = input("DHL", "Express");
        bad.display_name = "  ".into();
        assert!(matches!(
            svc.create_setting(bad),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let svc = service();
        let setting = svc.create_setting(input("DHL", "Express")).unwrap();
        svc.delete_setting(&setting.id).unwrap();
        assert!(matches!(
            svc.get_setting(&setting.id),
            Err(ServiceError::NotFound(_))
        ));
    }
}
