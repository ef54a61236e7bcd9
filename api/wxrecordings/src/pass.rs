use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One renderable image variant of a recorded pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enhancement {
    #[serde(rename = "type")]
    pub kind: String,
    pub precip: bool,
    pub map: bool,
}

impl Enhancement {
    /// Parse a manifest token of the form `kind[-precip][-map]`
    pub fn from_token(token: &str) -> Self {
        let mut rest = token;
        let map = match rest.strip_suffix("-map") {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };
        let precip = match rest.strip_suffix("-precip") {
            Some(stripped) => {
                rest = stripped;
                true
            }
            None => false,
        };

        Enhancement {
            kind: rest.to_string(),
            precip,
            map,
        }
    }

    /// Rebuild the manifest token, flag suffixes in canonical order
    pub fn token(&self) -> String {
        let mut token = self.kind.clone();
        if self.precip {
            token.push_str("-precip");
        }
        if self.map {
            token.push_str("-map");
        }
        token
    }

    /// Human-readable name for the known wxtoimg enhancement kinds
    pub fn label(&self) -> String {
        match self.kind.as_str() {
            "msa" => "MSA (multispectral analysis)".to_string(),
            "mcir" => "MCIR (map colour IR)".to_string(),
            "hvc" => "HVC (false colour)".to_string(),
            "hvct" => "HVCT (false colour)".to_string(),
            "therm" => "Thermal".to_string(),
            "contrasta" => "Contrast A".to_string(),
            "contrastb" => "Contrast B".to_string(),
            "pris" => "Pristine".to_string(),
            other => other.to_uppercase(),
        }
    }
}

/// One recorded satellite pass and its available enhancements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pass {
    pub start: String,
    pub end: String,
    pub satellite: String,
    pub enhancements: Vec<Enhancement>,
}

impl Pass {
    /// Numeric value of the start timestamp, used for catalog ordering
    pub fn start_value(&self) -> u64 {
        self.start.parse().unwrap_or(0)
    }

    /// Directory segment shared by all of this pass's image assets
    pub fn directory(&self) -> String {
        format!("{}-{}-{}", self.start, self.end, self.satellite)
    }

    /// True when (start, end, satellite) all match
    pub fn matches(&self, start: &str, end: &str, satellite: &str) -> bool {
        self.start == start && self.end == end && self.satellite == satellite
    }

    /// Human-readable satellite name, e.g. "noaa-19" -> "NOAA 19"
    pub fn satellite_label(&self) -> String {
        self.satellite.replace('-', " ").to_uppercase()
    }

    /// Pass start rendered as a UTC date and time
    pub fn start_label(&self) -> String {
        match NaiveDateTime::parse_from_str(&self.start, "%Y%m%d%H%M%S") {
            Ok(start) => start.format("%Y-%m-%d %H:%M UTC").to_string(),
            Err(_) => self.start.clone(),
        }
    }

    /// Window/header title for this pass
    pub fn title(&self) -> String {
        format!("{} on {}", self.satellite_label(), self.start_label())
    }
}

/// Parse the newline-delimited pass manifest.
///
/// Each line is `start end satellite enh1 enh2 ...`. Lines yielding no
/// enhancements are dropped. The result is sorted ascending by start time,
/// with each pass's enhancements ordered by kind (manifest order breaks
/// ties), so same-kind variants sit next to each other.
pub fn parse_pass_list(text: &str) -> Vec<Pass> {
    let mut passes = Vec::new();

    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 4 {
            continue;
        }

        let mut enhancements: Vec<Enhancement> = fields[3..]
            .iter()
            .map(|token| Enhancement::from_token(token))
            .collect();
        enhancements.sort_by(|a, b| a.kind.cmp(&b.kind));

        passes.push(Pass {
            start: fields[0].to_string(),
            end: fields[1].to_string(),
            satellite: fields[2].to_string(),
            enhancements,
        });
    }

    passes.sort_by_key(|pass| pass.start_value());
    passes
}

/// Relative asset path for one enhancement image
pub fn image_path(pass: &Pass, enhancement: &Enhancement) -> String {
    let directory = pass.directory();
    format!(
        "/images/{}/{}-{}.webp",
        directory,
        directory,
        enhancement.token()
    )
}

/// Absolute asset URL for one enhancement image
pub fn image_url(base_url: &str, pass: &Pass, enhancement: &Enhancement) -> String {
    format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        image_path(pass, enhancement)
    )
}
