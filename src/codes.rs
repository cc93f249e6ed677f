//! Fixed code→label enumerations used by the survey questionnaire.
//!
//! Every table is an immutable [`CodeTable`]. Lookups of codes with no entry
//! return `None`; callers decide whether that means "missing label" or a
//! fallback such as [`OTHER_MODAL`].

/// An immutable mapping from questionnaire code to display label.
#[derive(Debug)]
pub struct CodeTable {
    pub name: &'static str,
    entries: &'static [(i64, &'static str)],
}

impl CodeTable {
    pub const fn new(name: &'static str, entries: &'static [(i64, &'static str)]) -> Self {
        Self { name, entries }
    }

    /// Returns the label for `code`, if the table has one.
    pub fn get(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    /// Label lookup for an optional code.
    pub fn get_opt(&self, code: Option<i64>) -> Option<&'static str> {
        code.and_then(|c| self.get(c))
    }

    /// Returns the code whose label is `label`.
    pub fn code_of(&self, label: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(c, _)| *c)
    }

    /// Iterates `(code, label)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &'static str)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Label used for modal codes missing from [`MODAL`].
pub const OTHER_MODAL: &str = "Outro";

/// Highest modal code present in [`MODAL`].
pub const MAX_MODAL_CODE: u8 = 12;

pub static SEX: CodeTable = CodeTable::new("sexo", &[(1, "Masculino"), (2, "Feminino")]);

pub static AGE_BRACKET: CodeTable = CodeTable::new(
    "faixa_etaria",
    &[
        (1, "Até 6 anos"),
        (2, "6 a 15 anos"),
        (3, "16 a 24 anos"),
        (4, "25 a 39 anos"),
        (5, "40 a 59 anos"),
        (6, "Acima de 60 anos"),
    ],
);

pub static INCOME: CodeTable = CodeTable::new(
    "renda",
    &[
        (1, "Até 1 SM"),
        (2, "1 a 2 SM"),
        (3, "2 a 3 SM"),
        (4, "3 a 5 SM"),
        (5, "5 a 10 SM"),
        (6, "10 a 20 SM"),
        (7, "+ 20 SM"),
        (8, "Sem rendimento"),
        (9, "Sem declaração"),
    ],
);

pub static MODAL: CodeTable = CodeTable::new(
    "modal",
    &[
        (0, "Não declarado"),
        (1, "A pé"),
        (2, "Bicicleta"),
        (3, "Ônibus"),
        (4, "Metrô"),
        (5, "Carro (dirigindo)"),
        (6, "Carona familiar"),
        (7, "Carona amigo/colega"),
        (8, "Carro com motorista"),
        (9, "Motocicleta"),
        (10, "Transporte escolar"),
        (11, "Táxi"),
        (12, "Fretado"),
    ],
);

pub static APP_USAGE: CodeTable = CodeTable::new(
    "utiliza_app_taxi",
    &[
        (0, "Não declarado"),
        (1, "Nunca"),
        (2, "Às vezes"),
        (3, "Sempre"),
    ],
);

pub static TERMINAL: CodeTable = CodeTable::new(
    "terminal_int",
    &[
        (0, "Não declarado"),
        (1, "TI Aeroporto"),
        (2, "TI Afogados"),
        (3, "TI Barro"),
        (4, "TI Cabo"),
        (5, "TI Cajueiro Seco"),
        (6, "TI Camaragibe"),
        (7, "TI Cavaleiro"),
        (8, "TI Caxangá"),
        (9, "TI Igarassu"),
        (10, "TI Jaboatão"),
        (11, "TI Joana Bezerra"),
        (12, "TI Macaxeira"),
        (13, "TI PE-15"),
        (14, "TI Pelópidas Silveira"),
        (15, "TI Recife"),
        (16, "TI Tancredo Neves"),
        (17, "TI TIP"),
        (18, "TI Xambá"),
        (19, "TI Rio Doce"),
    ],
);

pub static EDUCATION: CodeTable = CodeTable::new(
    "nivel_estudo",
    &[
        (0, "Não declarado"),
        (1, "Fundamental"),
        (2, "Médio"),
        (3, "Graduação"),
        (4, "Pós-Graduação"),
    ],
);

/// Modal display name, falling back to [`OTHER_MODAL`] for unknown codes.
pub fn modal_name(code: i64) -> &'static str {
    MODAL.get(code).unwrap_or(OTHER_MODAL)
}
