//! Endpoint paths, relative to the configured backend base URL.

pub const GET_PATIENTS: &str = "get_patients.php";
pub const ADD_PATIENT: &str = "add_patient.php";
pub const UPDATE_PATIENT: &str = "update_patient_comprehensive.php";
pub const DELETE_PATIENT: &str = "delete_patient.php";
pub const GET_ALL_MEDICAL_RECORDS: &str = "get_all_medical_records.php";

pub const GET_DISEASES: &str = "get_diseases.php";
pub const ADD_DISEASE: &str = "add_disease.php";
pub const UPDATE_DISEASE: &str = "update_disease.php";
pub const DELETE_DISEASE: &str = "delete_disease.php";

pub const GET_AUDIT_LOGS: &str = "get_audit_logs.php";
pub const GET_ACTIVITY_LOGS: &str = "get_activity_logs.php";

pub const GET_BARANGAY_HEATMAP: &str = "get_barangay_heatmap.php";
pub const GET_RHU_EXPORT_DATA: &str = "get_rhu_export_data.php";
pub const GET_DASHBOARD_DATA: &str = "get_dashboard_data.php";

pub const GET_FORECASTS: &str = "get_forecasts.php";
pub const ARIMA_FORECAST: &str = "arima_forecast_disease_summary.php";
pub const SEIR_FORECAST: &str = "seir_forecast.php";
pub const SAVE_FORECAST: &str = "save_forecast.php";
pub const DELETE_FORECAST: &str = "delete_forecast.php";

pub const GET_USERS: &str = "get_users.php";
pub const ADD_USER: &str = "add_user.php";
pub const UPDATE_USER: &str = "update_user.php";
pub const DELETE_USER: &str = "delete_user.php";
pub const TOGGLE_USER_STATUS: &str = "toggle_user_status.php";

pub const GET_SETTINGS: &str = "get_settings.php";
pub const UPDATE_SETTINGS: &str = "update_settings.php";
pub const CHANGE_PASSWORD: &str = "change_password.php";

pub const BACKUP_RESTORE: &str = "api/backup_restore.php";
