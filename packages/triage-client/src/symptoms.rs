//! Catálogo de sintomas aceitos pelo modelo
//!
//! Os nomes usam o formato do modelo (`high_fever`); [`display_name`]
//! produz o rótulo legível.

use std::str::FromStr;

/// Sintomas gerais, sem região do corpo
pub const COMMON_SYMPTOMS: &[&str] = &[
    "fatigue", "weakness", "high_fever", "breathlessness", "sweating", "dehydration",
    "loss_of_appetite", "weight_loss", "weight_gain", "anxiety", "restlessness",
    "lethargy", "irritability", "headache", "dizziness", "nausea", "vomiting",
    "chills", "shivering", "cold_hands_and_feets", "mild_fever", "malaise",
    "muscle_pain", "lack_of_concentration", "obesity", "excessive_hunger",
];

/// Grupos de sintomas por área do corpo
pub const SYMPTOM_GROUPS: &[(&str, &[&str])] = &[
    (
        "Head & Face",
        &[
            "headache", "sunken_eyes", "yellowing_of_eyes", "yellow_crust_ooze",
            "dischromic_patches", "puffy_face_and_eyes", "altered_sensorium",
        ],
    ),
    (
        "Eyes & Ears",
        &[
            "watering_from_eyes", "redness_of_eyes", "blurred_and_distorted_vision",
            "visual_disturbances", "loss_of_smell",
        ],
    ),
    (
        "Neck & Throat",
        &[
            "throat_irritation", "swelled_lymph_nodes", "stiff_neck", "neck_pain",
            "patches_in_throat", "enlarged_thyroid", "ulcers_on_tongue",
        ],
    ),
    (
        "Chest & Respiratory",
        &[
            "breathlessness", "chest_pain", "cough", "phlegm", "fast_heart_rate",
            "rusty_sputum", "mucoid_sputum", "blood_in_sputum", "palpitations",
            "continuous_sneezing", "congestion", "runny_nose", "sinus_pressure",
        ],
    ),
    (
        "Abdomen & Pelvic",
        &[
            "stomach_pain", "acidity", "indigestion", "abdominal_pain", "belly_pain",
            "stomach_bleeding", "distention_of_abdomen", "constipation", "diarrhoea",
            "pain_during_bowel_movements", "bloody_stool", "passage_of_gases",
            "internal_itching", "swelling_of_stomach", "irritation_in_anus",
        ],
    ),
    (
        "Reproductive & Urinary",
        &[
            "burning_micturition", "spotting_urination", "continuous_feel_of_urine",
            "bladder_discomfort", "foul_smell_of_urine", "dark_urine", "yellow_urine",
            "polyuria", "abnormal_menstruation",
        ],
    ),
    (
        "Skin",
        &[
            "itching", "skin_rash", "pus_filled_pimples", "blackheads", "scurring",
            "skin_peeling", "silver_like_dusting", "small_dents_in_nails",
            "inflammatory_nails", "blister", "red_sore_around_nose", "nodal_skin_eruptions",
            "bruising", "red_spots_over_body", "yellowish_skin", "brittle_nails",
        ],
    ),
    (
        "Back",
        &["back_pain", "muscle_wasting", "spinning_movements", "loss_of_balance"],
    ),
    (
        "Arms",
        &[
            "muscle_weakness", "muscle_pain", "swelling_joints", "movement_stiffness",
            "weakness_in_limbs", "weakness_of_one_body_side",
        ],
    ),
    (
        "Legs",
        &[
            "knee_pain", "hip_joint_pain", "joint_pain", "painful_walking",
            "unsteadiness", "swollen_legs", "prominent_veins_on_calf", "swollen_extremeties",
        ],
    ),
];

/// Vocabulário completo do modelo, em ordem alfabética
pub const ALL_SYMPTOMS: &[&str] = &[
    "abdominal_pain", "abnormal_menstruation", "acidity", "acute_liver_failure",
    "altered_sensorium", "anxiety", "back_pain", "belly_pain", "blackheads",
    "bladder_discomfort", "blister", "blood_in_sputum", "bloody_stool",
    "blurred_and_distorted_vision", "breathlessness", "brittle_nails", "bruising",
    "burning_micturition", "chest_pain", "chills", "cold_hands_and_feets", "coma",
    "congestion", "constipation", "continuous_feel_of_urine", "continuous_sneezing",
    "cough", "cramps", "dark_urine", "dehydration", "depression", "diarrhoea",
    "dischromic_patches", "distention_of_abdomen", "dizziness", "drying_and_tingling_lips",
    "enlarged_thyroid", "excessive_hunger", "extra_marital_contacts", "family_history",
    "fast_heart_rate", "fatigue", "fluid_overload", "foul_smell_of_urine",
    "headache", "high_fever", "hip_joint_pain", "history_of_alcohol_consumption",
    "increased_appetite", "indigestion", "inflammatory_nails", "internal_itching",
    "irregular_sugar_level", "irritability", "irritation_in_anus", "itching",
    "joint_pain", "knee_pain", "lack_of_concentration", "lethargy", "loss_of_appetite",
    "loss_of_balance", "loss_of_smell", "malaise", "mild_fever", "mood_swings",
    "movement_stiffness", "mucoid_sputum", "muscle_pain", "muscle_wasting",
    "muscle_weakness", "nausea", "neck_pain", "nodal_skin_eruptions", "obesity",
    "pain_during_bowel_movements", "pain_in_anal_region", "painful_walking",
    "palpitations", "passage_of_gases", "patches_in_throat", "phlegm", "polyuria",
    "prominent_veins_on_calf", "puffy_face_and_eyes", "pus_filled_pimples",
    "receiving_blood_transfusion", "receiving_unsterile_injections", "red_sore_around_nose",
    "red_spots_over_body", "redness_of_eyes", "restlessness", "runny_nose",
    "rusty_sputum", "scurring", "shivering", "silver_like_dusting", "sinus_pressure",
    "skin_peeling", "skin_rash", "slurred_speech", "small_dents_in_nails",
    "spinning_movements", "spotting_urination", "stiff_neck", "stomach_bleeding",
    "stomach_pain", "sunken_eyes", "sweating", "swelled_lymph_nodes", "swelling_joints",
    "swelling_of_stomach", "swollen_blood_vessels", "swollen_extremeties",
    "swollen_legs", "throat_irritation", "toxic_look_(typhos)", "ulcers_on_tongue",
    "unsteadiness", "visual_disturbances", "vomiting", "watering_from_eyes",
    "weakness_in_limbs", "weakness_of_one_body_side", "weight_gain", "weight_loss",
    "yellow_crust_ooze", "yellow_urine", "yellowing_of_eyes", "yellowish_skin",
];

/// Região clicável da silhueta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRegion {
    Head,
    Chest,
    Stomach,
    ArmLeft,
    ArmRight,
    LegLeft,
    LegRight,
}

impl BodyRegion {
    pub const ALL: [BodyRegion; 7] = [
        BodyRegion::Head,
        BodyRegion::Chest,
        BodyRegion::Stomach,
        BodyRegion::ArmLeft,
        BodyRegion::ArmRight,
        BodyRegion::LegLeft,
        BodyRegion::LegRight,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            BodyRegion::Head => "head",
            BodyRegion::Chest => "chest",
            BodyRegion::Stomach => "stomach",
            BodyRegion::ArmLeft => "arm-left",
            BodyRegion::ArmRight => "arm-right",
            BodyRegion::LegLeft => "leg-left",
            BodyRegion::LegRight => "leg-right",
        }
    }

    /// Nome exibido no seletor
    pub fn display_name(&self) -> &'static str {
        match self {
            BodyRegion::Head => "Head, Face & Neck",
            BodyRegion::Chest => "Chest & Back",
            BodyRegion::Stomach => "Abdomen & Pelvic",
            BodyRegion::ArmLeft => "Left Arm & Hand",
            BodyRegion::ArmRight => "Right Arm & Hand",
            BodyRegion::LegLeft => "Left Leg & Foot",
            BodyRegion::LegRight => "Right Leg & Foot",
        }
    }

    fn groups(&self) -> &'static [&'static str] {
        match self {
            BodyRegion::Head => &["Head & Face", "Neck & Throat", "Eyes & Ears"],
            BodyRegion::Chest => &["Chest & Respiratory", "Back"],
            BodyRegion::Stomach => &["Abdomen & Pelvic", "Reproductive & Urinary"],
            BodyRegion::ArmLeft | BodyRegion::ArmRight => &["Arms"],
            BodyRegion::LegLeft | BodyRegion::LegRight => &["Legs"],
        }
    }

    /// Sintomas oferecidos ao selecionar a região
    pub fn symptoms(&self) -> Vec<&'static str> {
        self.groups()
            .iter()
            .filter_map(|name| group(name))
            .flat_map(|symptoms| symptoms.iter().copied())
            .collect()
    }
}

impl FromStr for BodyRegion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        BodyRegion::ALL
            .into_iter()
            .find(|region| region.id() == wanted)
            .ok_or_else(|| format!("Região desconhecida: {}", s))
    }
}

/// Sintomas de um grupo pelo nome
pub fn group(name: &str) -> Option<&'static [&'static str]> {
    SYMPTOM_GROUPS
        .iter()
        .find(|(group, _)| *group == name)
        .map(|(_, symptoms)| *symptoms)
}

pub fn is_known(symptom: &str) -> bool {
    ALL_SYMPTOMS.binary_search(&symptom).is_ok()
}

/// `high_fever` → `High Fever`
pub fn display_name(symptom: &str) -> String {
    symptom
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Sintomas do vocabulário mencionados num texto livre, na ordem em que
/// aparecem. Aceita tanto `high fever` quanto `high_fever`.
///
/// Usado pelo assistente só quando nenhum sintoma foi selecionado, para
/// que o diagnóstico a frio não parta de uma lista vazia.
pub fn extract_symptoms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase().replace('_', " ");

    let mut found: Vec<(usize, &str)> = ALL_SYMPTOMS
        .iter()
        .filter_map(|symptom| {
            let phrase = symptom.replace('_', " ");
            find_phrase(&lowered, &phrase).map(|pos| (pos, *symptom))
        })
        .collect();

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, s)| s.to_string()).collect()
}

/// Posição da primeira ocorrência de `phrase` como palavra inteira
fn find_phrase(haystack: &str, phrase: &str) -> Option<usize> {
    let is_word = |c: char| c.is_alphanumeric();

    haystack.match_indices(phrase).map(|(pos, _)| pos).find(|&pos| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + phrase.len()..].chars().next();
        !before.is_some_and(is_word) && !after.is_some_and(is_word)
    })
}
