//! Record service: every non-list call the pages make against the backend.
//!
//! Lists go through [`crate::pipeline`]; this is the write side plus the
//! one-shot reads (dashboard, forecasts, settings, backups). Form-backed
//! mutations are validated before anything is sent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::api::{routes, Ack, ApiClient, Payload, DATA};
use crate::app::context::BackupBackend;
use crate::app::forms::{check, DiseaseForm, PasswordChange, PatientForm, UserForm};
use crate::error::{PrmsError, Result};
use crate::models::{
    ArimaForecast, BackupFile, ClinicSettings, DashboardData, DatabaseSize, Disease, ForecastRecord,
    HeatmapPoint, HeatmapSummary, MedicalRecord, Patient, RhuExportRecord, SeirForecast, SettingsUpdate,
    User, UserUpdate,
};

/// Pause between generating a SEIR run and saving it.
pub const STAGING_DELAY: Duration = Duration::from_millis(500);

#[derive(Serialize)]
struct WithId<'a, T: Serialize> {
    id: i64,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Deserialize)]
struct Heatmap {
    data: Vec<HeatmapPoint>,
    #[serde(default)]
    summary: HeatmapSummary,
}

#[derive(Deserialize)]
struct Saved {
    #[serde(default)]
    forecast_id: Option<i64>,
}

/// A generated SEIR forecast and, when saving worked, its stored id.
#[derive(Debug, Clone, PartialEq)]
pub struct SeirRun {
    pub forecast: SeirForecast,
    pub saved_id: Option<i64>,
}

#[derive(Clone)]
pub struct RecordService {
    client: ApiClient,
    catalog: Arc<DashMap<i64, Disease>>,
    catalog_loaded: Arc<AtomicBool>,
    staging_delay: Duration,
}

impl RecordService {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            catalog: Arc::new(DashMap::new()),
            catalog_loaded: Arc::new(AtomicBool::new(false)),
            staging_delay: STAGING_DELAY,
        }
    }

    pub fn with_staging_delay(mut self, delay: Duration) -> Self {
        self.staging_delay = delay;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // ===== Patients =====

    #[instrument(skip(self, form), fields(name = %form.full_name()))]
    pub async fn add_patient(&self, form: &PatientForm) -> Result<Patient> {
        check(form)?;
        let patient: Patient = self
            .client
            .post_json(routes::ADD_PATIENT, form, DATA)
            .await?
            .into_payload()?;
        info!(id = patient.id, "patient registered");
        Ok(patient)
    }

    /// Updates demographics and, through `record`, any medical-record
    /// columns (`diagnosis`, `blood_pressure`, ...).
    #[instrument(skip(self, form, record))]
    pub async fn update_patient(&self, id: i64, form: &PatientForm, record: Map<String, Value>) -> Result<Ack> {
        check(form)?;
        let mut body = record;
        if let Value::Object(fields) = serde_json::to_value(form)? {
            body.extend(fields);
        }
        body.insert("id".into(), json!(id));
        body.insert("full_name".into(), json!(form.full_name()));
        let ack = self
            .client
            .post_json(routes::UPDATE_PATIENT, &body, Payload::Root)
            .await?
            .into_payload()?;
        info!("patient updated");
        Ok(ack)
    }

    #[instrument(skip(self))]
    pub async fn delete_patient(&self, id: i64) -> Result<Ack> {
        let ack = self
            .client
            .delete_json(routes::DELETE_PATIENT, &json!({ "id": id }), Payload::Root)
            .await?
            .into_payload()?;
        info!("patient deleted");
        Ok(ack)
    }

    /// Full consultation history of one patient, newest first.
    #[instrument(skip(self))]
    pub async fn medical_records(&self, patient_id: i64) -> Result<Vec<MedicalRecord>> {
        let params = [("patient_id".to_string(), patient_id.to_string())];
        self.client
            .get(routes::GET_ALL_MEDICAL_RECORDS, &params, DATA)
            .await?
            .into_payload()
    }

    // ===== Diseases =====

    /// Disease catalog, served from memory after the first load.
    #[instrument(skip(self))]
    pub async fn diseases(&self) -> Result<Vec<Disease>> {
        if !self.catalog_loaded.load(Ordering::Acquire) {
            let fresh: Vec<Disease> = self
                .client
                .get(routes::GET_DISEASES, &[], DATA)
                .await?
                .into_payload()?;
            debug!(count = fresh.len(), "disease catalog loaded");
            self.catalog.clear();
            for disease in fresh {
                self.catalog.insert(disease.id, disease);
            }
            self.catalog_loaded.store(true, Ordering::Release);
        }
        let mut diseases: Vec<Disease> = self.catalog.iter().map(|entry| entry.value().clone()).collect();
        diseases.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(diseases)
    }

    pub fn invalidate_catalog(&self) {
        self.catalog_loaded.store(false, Ordering::Release);
        self.catalog.clear();
    }

    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn add_disease(&self, form: &DiseaseForm) -> Result<Disease> {
        check(form)?;
        let disease: Disease = self
            .client
            .post_json(routes::ADD_DISEASE, form, Payload::Root)
            .await?
            .into_payload()?;
        // A cold catalog picks the new row up on its first load.
        if self.catalog_loaded.load(Ordering::Acquire) {
            self.catalog.insert(disease.id, disease.clone());
        }
        info!(id = disease.id, "disease added");
        Ok(disease)
    }

    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn update_disease(&self, id: i64, form: &DiseaseForm) -> Result<Ack> {
        check(form)?;
        let ack = self
            .client
            .post_json(routes::UPDATE_DISEASE, &WithId { id, body: form }, Payload::Root)
            .await?
            .into_payload()?;
        self.invalidate_catalog();
        info!("disease updated");
        Ok(ack)
    }

    #[instrument(skip(self))]
    pub async fn delete_disease(&self, id: i64) -> Result<Ack> {
        let ack = self
            .client
            .delete_json(routes::DELETE_DISEASE, &json!({ "id": id }), Payload::Root)
            .await?
            .into_payload()?;
        self.catalog.remove(&id);
        info!("disease deleted");
        Ok(ack)
    }

    // ===== Tracker and reports =====

    #[instrument(skip(self))]
    pub async fn heatmap(&self) -> Result<(Vec<HeatmapPoint>, HeatmapSummary)> {
        let heatmap: Heatmap = self
            .client
            .get(routes::GET_BARANGAY_HEATMAP, &[], Payload::Root)
            .await?
            .into_payload()?;
        Ok((heatmap.data, heatmap.summary))
    }

    /// RHU-IS export rows for the last `days` days.
    #[instrument(skip(self))]
    pub async fn rhu_report(
        &self,
        disease: Option<&str>,
        barangay: Option<&str>,
        days: u32,
    ) -> Result<Vec<RhuExportRecord>> {
        let mut params = vec![("days".to_string(), days.to_string())];
        if let Some(disease) = disease.filter(|d| !d.is_empty() && !d.eq_ignore_ascii_case("all")) {
            params.push(("disease".into(), disease.into()));
        }
        if let Some(barangay) = barangay.filter(|b| !b.is_empty() && !b.eq_ignore_ascii_case("all")) {
            params.push(("barangay".into(), barangay.into()));
        }
        self.client
            .get(routes::GET_RHU_EXPORT_DATA, &params, DATA)
            .await?
            .into_payload()
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardData> {
        self.client
            .get(routes::GET_DASHBOARD_DATA, &[], Payload::Root)
            .await?
            .into_payload()
    }

    // ===== Forecasts =====

    #[instrument(skip(self))]
    pub async fn forecasts(&self) -> Result<Vec<ForecastRecord>> {
        self.client
            .get(routes::GET_FORECASTS, &[], Payload::Field("forecasts"))
            .await?
            .into_payload()
    }

    #[instrument(skip(self))]
    pub async fn delete_forecast(&self, forecast_id: i64) -> Result<Ack> {
        let ack = self
            .client
            .post_json(routes::DELETE_FORECAST, &json!({ "forecast_id": forecast_id }), Payload::Root)
            .await?
            .into_payload()?;
        info!("forecast deleted");
        Ok(ack)
    }

    /// Monthly ARIMA case forecast. `None` covers every disease.
    #[instrument(skip(self))]
    pub async fn arima_forecast(&self, disease: Option<&str>, months: u32) -> Result<ArimaForecast> {
        let body = json!({ "disease": disease, "forecast_period": months });
        let forecast: ArimaForecast = self
            .client
            .post_json(routes::ARIMA_FORECAST, &body, DATA)
            .await?
            .into_payload()?;
        let failed = forecast.forecast_results.iter().filter(|r| r.is_error()).count();
        if failed > 0 {
            warn!(failed, "some diseases could not be forecast");
        }
        Ok(forecast)
    }

    /// Runs the SEIR model for `days` days and stores the result.
    ///
    /// A failed save is logged and leaves `saved_id` empty; the forecast
    /// itself is still returned.
    #[instrument(skip(self))]
    pub async fn seir_forecast(&self, disease: &str, days: u32, population: Option<u32>) -> Result<SeirRun> {
        let params = [
            ("disease".to_string(), disease.to_string()),
            ("days".to_string(), days.to_string()),
            ("population".to_string(), population.unwrap_or(0).to_string()),
        ];
        let forecast: SeirForecast = self
            .client
            .get(routes::SEIR_FORECAST, &params, Payload::Root)
            .await?
            .into_payload()?;

        tokio::time::sleep(self.staging_delay).await;

        let mut body = serde_json::to_value(&forecast)?;
        if let Value::Object(fields) = &mut body {
            fields.insert("interpretation".into(), serde_json::to_value(forecast.interpretation_or_default())?);
        }
        let saved_id = match self.client.post_json::<_, Saved>(routes::SAVE_FORECAST, &body, Payload::Root).await {
            Ok(response) => match response.into_payload() {
                Ok(saved) => saved.forecast_id,
                Err(e) => {
                    warn!(error = %e, "forecast generated but not saved");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "forecast generated but not saved");
                None
            }
        };
        info!(?saved_id, "seir forecast generated");
        Ok(SeirRun { forecast, saved_id })
    }

    // ===== Users and settings =====

    #[instrument(skip(self))]
    pub async fn users(&self) -> Result<Vec<User>> {
        self.client
            .get(routes::GET_USERS, &[], Payload::Field("users"))
            .await?
            .into_payload()
    }

    #[instrument(skip(self, form), fields(username = %form.username))]
    pub async fn add_user(&self, form: &UserForm) -> Result<Ack> {
        check(form)?;
        self.client
            .post_json(routes::ADD_USER, form, Payload::Root)
            .await?
            .into_payload()
    }

    #[instrument(skip(self, update), fields(id = update.id))]
    pub async fn update_user(&self, update: &UserUpdate) -> Result<Ack> {
        if !update.has_changes() {
            return Err(PrmsError::Backend(
                "User ID and at least one field (username, password, role, or status) are required.".into(),
            ));
        }
        self.client
            .post_json(routes::UPDATE_USER, update, Payload::Root)
            .await?
            .into_payload()
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<Ack> {
        self.client
            .post_json(routes::DELETE_USER, &json!({ "id": id }), Payload::Root)
            .await?
            .into_payload()
    }

    /// Flips a user between active and inactive; returns the backend's
    /// confirmation text.
    #[instrument(skip(self, user), fields(id = user.id))]
    pub async fn toggle_user_status(&self, user: &User) -> Result<Ack> {
        let status = if user.is_active() { "inactive" } else { "active" };
        self.client
            .post_json(routes::TOGGLE_USER_STATUS, &json!({ "id": user.id, "status": status }), Payload::Root)
            .await?
            .into_payload()
    }

    #[instrument(skip(self))]
    pub async fn settings(&self) -> Result<ClinicSettings> {
        self.client
            .get(routes::GET_SETTINGS, &[], Payload::Field("settings"))
            .await?
            .into_payload()
    }

    #[instrument(skip(self, update))]
    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<ClinicSettings> {
        if update.is_empty() {
            return Err(PrmsError::Backend("No changes provided".into()));
        }
        self.client
            .post_json(routes::UPDATE_SETTINGS, update, Payload::Field("settings"))
            .await?
            .into_payload()
    }

    #[instrument(skip(self, change))]
    pub async fn change_password(&self, username: &str, change: &PasswordChange) -> Result<Ack> {
        check(change)?;
        let body = json!({
            "username": username,
            "old_password": change.current_password,
            "new_password": change.new_password,
        });
        self.client
            .post_json(routes::CHANGE_PASSWORD, &body, Payload::Root)
            .await?
            .into_payload()
    }

    // ===== Backups =====

    /// Raw SQL dump of one backup file.
    #[instrument(skip(self))]
    pub async fn download_backup(&self, file: &str) -> Result<Vec<u8>> {
        let params = [("action".to_string(), "download".to_string()), ("file".to_string(), file.to_string())];
        self.client.get_bytes(routes::BACKUP_RESTORE, &params).await
    }

    async fn backup_action(&self, form: &[(&str, &str)]) -> Result<Ack> {
        self.client
            .post_form(routes::BACKUP_RESTORE, form, Payload::Root)
            .await?
            .into_payload()
    }
}

#[async_trait]
impl BackupBackend for RecordService {
    async fn list_backups(&self) -> Result<Vec<BackupFile>> {
        let params = [("action".to_string(), "list".to_string())];
        self.client
            .get(routes::BACKUP_RESTORE, &params, DATA)
            .await?
            .into_payload()
    }

    async fn database_size(&self) -> Result<DatabaseSize> {
        let params = [("action".to_string(), "size".to_string())];
        self.client
            .get(routes::BACKUP_RESTORE, &params, DATA)
            .await?
            .into_payload()
    }

    async fn create_backup(&self) -> Result<Ack> {
        self.backup_action(&[("action", "backup")]).await
    }

    async fn restore_backup(&self, file: &str) -> Result<Ack> {
        self.backup_action(&[("action", "restore"), ("file", file)]).await
    }

    async fn delete_backup(&self, file: &str) -> Result<Ack> {
        self.backup_action(&[("action", "delete"), ("file", file)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_carries_id_beside_form_fields() {
        let form = DiseaseForm { name: "Dengue".into(), ..Default::default() };
        let body = serde_json::to_value(WithId { id: 7, body: &form }).unwrap();
        assert_eq!(body["id"], 7);
        assert_eq!(body["name"], "Dengue");
        assert!(body.get("color").is_none());
    }

    #[tokio::test]
    async fn invalid_forms_never_reach_the_network() {
        // Nothing listens here; a request would surface as a transport error.
        let service = RecordService::new(ApiClient::with_base_url("http://127.0.0.1:9").unwrap());
        let err = service.add_disease(&DiseaseForm::default()).await.unwrap_err();
        assert!(matches!(err, PrmsError::Validation(_)));

        let err = service
            .update_settings(&SettingsUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "No changes provided");
    }
}
