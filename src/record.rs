//! The raw respondent row as read from the survey CSV.

use serde::{Deserialize, Deserializer, Serialize};

/// One surveyed individual, exactly as the source table stores it.
///
/// Coded columns are decoded leniently: integers and float-formatted
/// integers ("2.0") are accepted, blanks and anything else become `None`.
/// Columns absent from the file take their default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "sexo", default, deserialize_with = "lenient_code")]
    pub sex: Option<i64>,
    #[serde(rename = "faixa_etaria", default, deserialize_with = "lenient_code")]
    pub age_bracket: Option<i64>,
    #[serde(rename = "renda", default, deserialize_with = "lenient_code")]
    pub income: Option<i64>,
    #[serde(rename = "nivel_estudo", default, deserialize_with = "lenient_code")]
    pub education: Option<i64>,

    #[serde(rename = "trabalha", default, deserialize_with = "lenient_code")]
    pub work_status: Option<i64>,
    #[serde(rename = "pesquisado_estuda", default, deserialize_with = "lenient_code")]
    pub study_status: Option<i64>,

    #[serde(rename = "meio_transporte_trab", default)]
    pub work_modals: Option<String>,
    #[serde(rename = "transporte_aula", default)]
    pub class_modals: Option<String>,
    #[serde(rename = "meios_transporte_filhos", default)]
    pub children_modals: Option<String>,

    #[serde(rename = "terminal_int_trabalho", default)]
    pub work_terminal: Option<String>,
    #[serde(
        rename = "utiliza_terminal_int_trabalho",
        default,
        deserialize_with = "lenient_code"
    )]
    pub work_terminal_integration: Option<i64>,
    #[serde(
        rename = "utiliza_integracao_aula",
        default,
        deserialize_with = "lenient_code"
    )]
    pub class_integration: Option<i64>,

    #[serde(rename = "bairro_residencia", default)]
    pub neighborhood: Option<String>,

    #[serde(
        rename = "utiliza_app_taxi_trabalho",
        default,
        deserialize_with = "lenient_code"
    )]
    pub app_usage_work: Option<i64>,
    #[serde(
        rename = "utiliza_app_taxi_aula",
        default,
        deserialize_with = "lenient_code"
    )]
    pub app_usage_class: Option<i64>,
    #[serde(
        rename = "utiliza_app_taxi_escola",
        default,
        deserialize_with = "lenient_code"
    )]
    pub app_usage_school: Option<i64>,
}

/// Parses a questionnaire code, tolerating float formatting.
pub fn parse_code(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Some(v as i64),
        _ => None,
    }
}

fn lenient_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_code))
}
