use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoStaticStr};

/// Tissue categories the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter)]
pub enum ClassLabel {
    #[strum(serialize = "lung_n")]
    Normal,
    #[strum(serialize = "lung_aca")]
    Adenocarcinoma,
    #[strum(serialize = "lung_scc")]
    SquamousCellCarcinoma,
}

impl ClassLabel {
    pub fn code(self) -> &'static str {
        self.into()
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ClassLabel::Normal => "Normal Lung Tissue",
            ClassLabel::Adenocarcinoma => "Lung Adenocarcinoma",
            ClassLabel::SquamousCellCarcinoma => "Lung Squamous Cell Carcinoma",
        }
    }
}

/// Human name for a class code; unknown codes are shown as-is.
pub fn display_name(code: &str) -> &str {
    ClassLabel::from_str(code)
        .map(ClassLabel::display_name)
        .unwrap_or(code)
}
