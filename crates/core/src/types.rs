//! Gemeinsame Identifikationstypen fuer Roulette
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_typ {
    ($(#[$meta:meta])* $name:ident, $praefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Erstellt eine neue zufaellige ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Gibt die innere UUID zurueck
            pub fn inner(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($praefix, ":{}"), self.0)
            }
        }
    };
}

id_typ!(
    /// Verbindungs-ID eines anonymen Teilnehmers (stabil fuer die Lebensdauer der Verbindung)
    UserId,
    "user"
);

id_typ!(
    /// Eindeutige Match-ID
    MatchId,
    "match"
);

id_typ!(
    /// Eindeutige Nachrichten-ID
    MessageId,
    "msg"
);

id_typ!(
    /// Eindeutige Meldungs-ID
    ReportId,
    "report"
);
