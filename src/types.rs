use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Position eligibility
// ---------------------------------------------------------------------------

/// The position a player is rostered at. Codes follow the import sheet
/// convention ("1B", "SP/RP", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryPosition {
    #[serde(rename = "C")]
    Catcher,
    #[serde(rename = "1B")]
    FirstBase,
    #[serde(rename = "2B")]
    SecondBase,
    #[serde(rename = "SS")]
    Shortstop,
    #[serde(rename = "3B")]
    ThirdBase,
    #[serde(rename = "RF")]
    RightField,
    #[serde(rename = "CF")]
    CenterField,
    #[serde(rename = "LF")]
    LeftField,
    #[serde(rename = "SP")]
    Starter,
    #[serde(rename = "SP/RP")]
    Swingman,
    #[serde(rename = "RP")]
    Reliever,
    #[serde(rename = "CP")]
    Closer,
}

impl PrimaryPosition {
    pub fn parse(code: &str) -> Option<Self> {
        let p = match code.trim().to_uppercase().as_str() {
            "C" => PrimaryPosition::Catcher,
            "1B" => PrimaryPosition::FirstBase,
            "2B" => PrimaryPosition::SecondBase,
            "SS" => PrimaryPosition::Shortstop,
            "3B" => PrimaryPosition::ThirdBase,
            "RF" => PrimaryPosition::RightField,
            "CF" => PrimaryPosition::CenterField,
            "LF" => PrimaryPosition::LeftField,
            "SP" => PrimaryPosition::Starter,
            "SP/RP" => PrimaryPosition::Swingman,
            "RP" => PrimaryPosition::Reliever,
            "CP" => PrimaryPosition::Closer,
            _ => return None,
        };
        Some(p)
    }

    pub fn code(&self) -> &'static str {
        match self {
            PrimaryPosition::Catcher => "C",
            PrimaryPosition::FirstBase => "1B",
            PrimaryPosition::SecondBase => "2B",
            PrimaryPosition::Shortstop => "SS",
            PrimaryPosition::ThirdBase => "3B",
            PrimaryPosition::RightField => "RF",
            PrimaryPosition::CenterField => "CF",
            PrimaryPosition::LeftField => "LF",
            PrimaryPosition::Starter => "SP",
            PrimaryPosition::Swingman => "SP/RP",
            PrimaryPosition::Reliever => "RP",
            PrimaryPosition::Closer => "CP",
        }
    }
}

impl std::fmt::Display for PrimaryPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Optional secondary eligibility. Either a single position or one of the
/// composite categories ("IF", "OF", ...) from the import sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecondaryPosition {
    #[serde(rename = "C")]
    Catcher,
    #[serde(rename = "1B")]
    FirstBase,
    #[serde(rename = "2B")]
    SecondBase,
    #[serde(rename = "SS")]
    Shortstop,
    #[serde(rename = "3B")]
    ThirdBase,
    #[serde(rename = "RF")]
    RightField,
    #[serde(rename = "CF")]
    CenterField,
    #[serde(rename = "LF")]
    LeftField,
    #[serde(rename = "IF")]
    Infield,
    #[serde(rename = "OF")]
    Outfield,
    #[serde(rename = "IF/OF")]
    InfieldOutfield,
    #[serde(rename = "1B/OF")]
    FirstBaseOutfield,
}

impl SecondaryPosition {
    pub fn parse(code: &str) -> Option<Self> {
        let p = match code.trim().to_uppercase().as_str() {
            "C" => SecondaryPosition::Catcher,
            "1B" => SecondaryPosition::FirstBase,
            "2B" => SecondaryPosition::SecondBase,
            "SS" => SecondaryPosition::Shortstop,
            "3B" => SecondaryPosition::ThirdBase,
            "RF" => SecondaryPosition::RightField,
            "CF" => SecondaryPosition::CenterField,
            "LF" => SecondaryPosition::LeftField,
            "IF" => SecondaryPosition::Infield,
            "OF" => SecondaryPosition::Outfield,
            "IF/OF" => SecondaryPosition::InfieldOutfield,
            "1B/OF" => SecondaryPosition::FirstBaseOutfield,
            _ => return None,
        };
        Some(p)
    }

    pub fn code(&self) -> &'static str {
        match self {
            SecondaryPosition::Catcher => "C",
            SecondaryPosition::FirstBase => "1B",
            SecondaryPosition::SecondBase => "2B",
            SecondaryPosition::Shortstop => "SS",
            SecondaryPosition::ThirdBase => "3B",
            SecondaryPosition::RightField => "RF",
            SecondaryPosition::CenterField => "CF",
            SecondaryPosition::LeftField => "LF",
            SecondaryPosition::Infield => "IF",
            SecondaryPosition::Outfield => "OF",
            SecondaryPosition::InfieldOutfield => "IF/OF",
            SecondaryPosition::FirstBaseOutfield => "1B/OF",
        }
    }

    /// Compatibility table: which rostered positions this eligibility covers.
    pub fn covers(&self, pos: PrimaryPosition) -> bool {
        use PrimaryPosition as P;
        match self {
            SecondaryPosition::Catcher => pos == P::Catcher,
            SecondaryPosition::FirstBase => pos == P::FirstBase,
            SecondaryPosition::SecondBase => pos == P::SecondBase,
            SecondaryPosition::Shortstop => pos == P::Shortstop,
            SecondaryPosition::ThirdBase => pos == P::ThirdBase,
            SecondaryPosition::RightField => pos == P::RightField,
            SecondaryPosition::CenterField => pos == P::CenterField,
            SecondaryPosition::LeftField => pos == P::LeftField,
            SecondaryPosition::Infield => matches!(
                pos,
                P::FirstBase | P::SecondBase | P::Shortstop | P::ThirdBase
            ),
            SecondaryPosition::Outfield => {
                matches!(pos, P::RightField | P::CenterField | P::LeftField)
            }
            SecondaryPosition::InfieldOutfield => matches!(
                pos,
                P::FirstBase
                    | P::SecondBase
                    | P::Shortstop
                    | P::ThirdBase
                    | P::RightField
                    | P::CenterField
                    | P::LeftField
            ),
            SecondaryPosition::FirstBaseOutfield => matches!(
                pos,
                P::FirstBase | P::RightField | P::CenterField | P::LeftField
            ),
        }
    }
}

impl std::fmt::Display for SecondaryPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Finalization
// ---------------------------------------------------------------------------

/// Terminal outcome of a finalize call. `AlreadyClosed` is the idempotent
/// short-circuit every caller after the first observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeStatus {
    Awarded,
    NoBids,
    AlreadyClosed,
}

impl std::fmt::Display for FinalizeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FinalizeStatus::Awarded => "awarded",
            FinalizeStatus::NoBids => "no_bids",
            FinalizeStatus::AlreadyClosed => "already_closed",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Audit events
// ---------------------------------------------------------------------------

/// One record per state-changing action. Append-only; never read back into
/// decision logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Nominate,
    Bid,
    Finalize,
    SettingsChange,
    ImportTeams,
    ImportPlayers,
    Reset,
    QuietPause,
    QuietResume,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::Nominate => "nominate",
            EventType::Bid => "bid",
            EventType::Finalize => "finalize",
            EventType::SettingsChange => "settings_change",
            EventType::ImportTeams => "import_teams",
            EventType::ImportPlayers => "import_players",
            EventType::Reset => "reset",
            EventType::QuietPause => "quiet_pause",
            EventType::QuietResume => "quiet_resume",
        };
        write!(f, "{s}")
    }
}
