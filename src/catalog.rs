use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{DatasetDescriptor, QueryParam};
use crate::error::EurostatError;

/// Only these query keys may carry several values: the decoder de-flattens
/// `geo x time`, so every other dimension must be pinned to one category.
const MULTI_VALUED_KEYS: &[&str] = &["geo", "time"];

const AREA: &[(&str, &str)] = &[("geo", "ES"), ("geo", "EU27_2020")];

type BuiltinEntry = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const BUILTIN: &[BuiltinEntry] = &[
    (
        "une_rt_m",
        "Desempleo",
        &[("sex", "T"), ("age", "TOTAL"), ("s_adj", "SA"), ("unit", "PC_ACT")],
    ),
    (
        "une_rt_m",
        "Desempleo juvenil",
        &[("sex", "T"), ("age", "Y_LT25"), ("s_adj", "SA"), ("unit", "PC_ACT")],
    ),
    (
        "une_rt_a",
        "Desempleo anual",
        &[("sex", "T"), ("age", "Y15-74"), ("unit", "PC_ACT")],
    ),
    (
        "prc_hicp_manr",
        "Inflacion IPCA",
        &[("coicop", "CP00"), ("unit", "RCH_A")],
    ),
    (
        "prc_hicp_manr",
        "Inflacion subyacente",
        &[("coicop", "TOT_X_NRG_FOOD"), ("unit", "RCH_A")],
    ),
    (
        "namq_10_gdp",
        "PIB trimestral",
        &[("na_item", "B1GQ"), ("s_adj", "SCA"), ("unit", "CLV_PCH_PRE")],
    ),
    (
        "nama_10_gdp",
        "PIB anual",
        &[("na_item", "B1GQ"), ("unit", "CP_MEUR")],
    ),
    (
        "nama_10_pc",
        "PIB per capita",
        &[("na_item", "B1GQ"), ("unit", "CP_EUR_HAB")],
    ),
    (
        "gov_10dd_edpt1",
        "Deuda publica",
        &[("na_item", "GD"), ("sector", "S13"), ("unit", "PC_GDP")],
    ),
    (
        "gov_10dd_edpt1",
        "Deficit publico",
        &[("na_item", "B9"), ("sector", "S13"), ("unit", "PC_GDP")],
    ),
    (
        "gov_10q_ggdebt",
        "Deuda publica trimestral",
        &[("na_item", "GD"), ("sector", "S13"), ("unit", "PC_GDP")],
    ),
    (
        "sts_inpr_m",
        "Produccion industrial",
        &[("nace_r2", "B-D"), ("s_adj", "SCA"), ("unit", "I21")],
    ),
    (
        "sts_trtu_m",
        "Comercio minorista",
        &[("indic_bt", "VOL_SLS"), ("nace_r2", "G47"), ("s_adj", "SCA"), ("unit", "I21")],
    ),
    (
        "sts_copr_m",
        "Produccion construccion",
        &[("indic_bt", "PRD"), ("nace_r2", "F"), ("s_adj", "SCA"), ("unit", "I21")],
    ),
    (
        "ei_bsco_m",
        "Confianza del consumidor",
        &[("indic", "BS-CSMCI"), ("s_adj", "SA"), ("unit", "BAL")],
    ),
    (
        "ei_bssi_m_r2",
        "Sentimiento economico",
        &[("indic", "BS-ESI-I"), ("s_adj", "SA")],
    ),
    (
        "prc_hpi_q",
        "Precio de la vivienda",
        &[("purchase", "TOTAL"), ("unit", "RCH_A")],
    ),
    (
        "lfsq_ergan",
        "Tasa de empleo",
        &[("sex", "T"), ("age", "Y20-64"), ("citizen", "TOTAL"), ("unit", "PC")],
    ),
    (
        "lc_lci_r2_q",
        "Coste laboral",
        &[("lcstruct", "D1_D4_MD5"), ("nace_r2", "B-S"), ("s_adj", "SCA"), ("unit", "PCH_SM")],
    ),
    (
        "demo_gind",
        "Poblacion",
        &[("indic_de", "JAN")],
    ),
    (
        "tour_occ_nim",
        "Pernoctaciones turisticas",
        &[("c_resid", "TOTAL"), ("nace_r2", "I551-I553"), ("unit", "NR")],
    ),
    (
        "nrg_pc_204",
        "Precio electricidad hogares",
        &[
            ("product", "6000"),
            ("nrg_cons", "KWH2500-4999"),
            ("tax", "I_TAX"),
            ("currency", "EUR"),
            ("unit", "KWH"),
        ],
    ),
    (
        "irt_lt_mcby_m",
        "Rendimiento bono 10 anos",
        &[("int_rt", "MCBY")],
    ),
    (
        "ilc_li02",
        "Riesgo de pobreza",
        &[("indic_il", "LI_R_MD60"), ("sex", "T"), ("age", "TOTAL"), ("unit", "PC")],
    ),
];

/// Validated, ordered list of dataset descriptors.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    datasets: Vec<DatasetDescriptor>,
}

impl Catalog {
    pub fn new(datasets: Vec<DatasetDescriptor>) -> Result<Self, EurostatError> {
        let mut names = HashSet::new();
        for descriptor in &datasets {
            validate_name(&descriptor.name)?;
            if !names.insert(descriptor.name.as_str()) {
                return Err(EurostatError::InvalidCatalog(format!(
                    "duplicate dataset name: {}",
                    descriptor.name
                )));
            }
            validate_params(descriptor)?;
        }
        Ok(Self { datasets })
    }

    /// The datasets published on every run.
    pub fn builtin() -> Result<Self, EurostatError> {
        let datasets = BUILTIN
            .iter()
            .map(|(code, name, params)| {
                let query_params = AREA
                    .iter()
                    .chain(params.iter())
                    .map(|(key, value)| QueryParam::new(key, value))
                    .collect();
                Ok(DatasetDescriptor::new(code.parse()?, name, query_params))
            })
            .collect::<Result<Vec<_>, EurostatError>>()?;
        Self::new(datasets)
    }

    pub fn datasets(&self) -> &[DatasetDescriptor] {
        &self.datasets
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

fn validate_name(name: &str) -> Result<(), EurostatError> {
    if name.trim().is_empty() {
        return Err(EurostatError::InvalidCatalog(
            "dataset name must not be empty".to_string(),
        ));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(EurostatError::InvalidCatalog(format!(
            "dataset name must not contain path separators: {name}"
        )));
    }
    Ok(())
}

fn validate_params(descriptor: &DatasetDescriptor) -> Result<(), EurostatError> {
    let mut seen_pairs = HashSet::new();
    let mut seen_keys = HashSet::new();
    for param in &descriptor.query_params {
        if !seen_pairs.insert((param.key.as_str(), param.value.as_str())) {
            return Err(EurostatError::InvalidCatalog(format!(
                "{}: query parameter {}={} is repeated",
                descriptor.name, param.key, param.value
            )));
        }
        if !seen_keys.insert(param.key.as_str()) && !MULTI_VALUED_KEYS.contains(&param.key.as_str())
        {
            return Err(EurostatError::InvalidCatalog(format!(
                "{}: query parameter {} may only have one value",
                descriptor.name, param.key
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub datasets: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CatalogEntry {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub params: Option<ParamsEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParamsEntry {
    Pairs(Vec<(String, String)>),
    Map(BTreeMap<String, ParamValue>),
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

pub struct CatalogLoader;

impl CatalogLoader {
    /// Loads a catalog override file, or the built-in catalog when no path is given.
    pub fn resolve(path: Option<&str>) -> Result<Catalog, EurostatError> {
        let Some(path) = path else {
            return Catalog::builtin();
        };
        let catalog_path = PathBuf::from(path);
        let content = fs::read_to_string(&catalog_path)
            .map_err(|_| EurostatError::CatalogRead(catalog_path.display().to_string()))?;
        let file: CatalogFile = serde_json::from_str(&content)
            .map_err(|err| EurostatError::CatalogParse(err.to_string()))?;
        Self::resolve_file(file)
    }

    pub fn resolve_file(file: CatalogFile) -> Result<Catalog, EurostatError> {
        let datasets = file
            .datasets
            .into_iter()
            .map(|entry| {
                let query_params = match entry.params {
                    None => Vec::new(),
                    Some(ParamsEntry::Pairs(pairs)) => pairs
                        .into_iter()
                        .map(|(key, value)| QueryParam { key, value })
                        .collect(),
                    Some(ParamsEntry::Map(map)) => map
                        .into_iter()
                        .flat_map(|(key, value)| {
                            let values = match value {
                                ParamValue::Single(value) => vec![value],
                                ParamValue::Many(values) => values,
                            };
                            values.into_iter().map(move |value| QueryParam {
                                key: key.clone(),
                                value,
                            })
                        })
                        .collect(),
                };
                Ok(DatasetDescriptor::new(
                    entry.code.parse()?,
                    &entry.name,
                    query_params,
                ))
            })
            .collect::<Result<Vec<_>, EurostatError>>()?;
        Catalog::new(datasets)
    }
}
