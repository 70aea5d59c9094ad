//! Filterpruefung
//!
//! Ein Filter ist einseitig: er beschreibt was der Anfragende vom Gegenueber
//! erwartet. Zwei Teilnehmer sind kompatibel wenn beide Filter (sofern
//! vorhanden) den jeweils anderen akzeptieren.
//!
//! Fehlende Profilangaben beim Gegenueber:
//! - Alter / Land: Bedingung wird nicht geprueft
//! - Geschlecht / Interessen: ein konkreter Wunsch ist nicht erfuellt

use roulette_core::{MatchFilter, UserSession};

/// Mindest-Reputation fuer `only_verified`
pub const MIN_REPUTATION_VERIFIZIERT: u32 = 80;

/// Prueft ob `gegenueber` den Filter erfuellt
pub fn filter_erfuellt(filter: &MatchFilter, gegenueber: &UserSession, min_reputation: u32) -> bool {
    if let Some(gender) = filter.gender {
        if !gender.akzeptiert(gegenueber.gender) {
            return false;
        }
    }

    if let (Some(bereich), Some(age)) = (filter.age_range, gegenueber.age) {
        if !bereich.enthaelt(age) {
            return false;
        }
    }

    if let Some(country) = &gegenueber.country {
        if !filter.countries.is_empty() && !filter.countries.contains(country) {
            return false;
        }
    }

    if !filter.interests.is_empty()
        && !gegenueber
            .interests
            .iter()
            .any(|i| filter.interests.contains(i))
    {
        return false;
    }

    if filter.only_verified && gegenueber.reputation < min_reputation {
        return false;
    }

    true
}

/// Bidirektionale Kompatibilitaet zweier Teilnehmer
pub fn kompatibel(
    a: &UserSession,
    filter_a: Option<&MatchFilter>,
    b: &UserSession,
    filter_b: Option<&MatchFilter>,
    min_reputation: u32,
) -> bool {
    filter_a.map_or(true, |f| filter_erfuellt(f, b, min_reputation))
        && filter_b.map_or(true, |f| filter_erfuellt(f, a, min_reputation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roulette_core::{AgeRange, Gender, GenderFilter, UserId};

    fn sitzung(gender: Option<Gender>, age: Option<u8>, country: Option<&str>) -> UserSession {
        let mut s = UserSession::neu(UserId::new());
        s.gender = gender;
        s.age = age;
        s.country = country.map(String::from);
        s
    }

    const MIN: u32 = MIN_REPUTATION_VERIFIZIERT;

    #[test]
    fn ohne_filter_immer_kompatibel() {
        let a = sitzung(None, None, None);
        let b = sitzung(Some(Gender::Female), Some(40), Some("DE"));
        assert!(kompatibel(&a, None, &b, None, MIN));
    }

    #[test]
    fn geschlecht_wird_streng_geprueft() {
        let filter = MatchFilter {
            gender: Some(GenderFilter::Female),
            ..Default::default()
        };
        assert!(!filter_erfuellt(&filter, &sitzung(Some(Gender::Male), None, None), MIN));
        assert!(!filter_erfuellt(&filter, &sitzung(None, None, None), MIN));
        assert!(filter_erfuellt(&filter, &sitzung(Some(Gender::Female), None, None), MIN));

        let egal = MatchFilter {
            gender: Some(GenderFilter::Any),
            ..Default::default()
        };
        assert!(filter_erfuellt(&egal, &sitzung(None, None, None), MIN));
    }

    #[test]
    fn alter_nur_geprueft_wenn_angegeben() {
        let filter = MatchFilter {
            age_range: Some(AgeRange { min: 18, max: 30 }),
            ..Default::default()
        };
        assert!(filter_erfuellt(&filter, &sitzung(None, Some(18), None), MIN));
        assert!(filter_erfuellt(&filter, &sitzung(None, Some(30), None), MIN));
        assert!(!filter_erfuellt(&filter, &sitzung(None, Some(31), None), MIN));
        assert!(filter_erfuellt(&filter, &sitzung(None, None, None), MIN));
    }

    #[test]
    fn land_nur_geprueft_wenn_angegeben() {
        let filter = MatchFilter {
            countries: vec!["DE".into(), "AT".into()],
            ..Default::default()
        };
        assert!(filter_erfuellt(&filter, &sitzung(None, None, Some("AT")), MIN));
        assert!(!filter_erfuellt(&filter, &sitzung(None, None, Some("FR")), MIN));
        assert!(filter_erfuellt(&filter, &sitzung(None, None, None), MIN));
    }

    #[test]
    fn interessen_ohne_angabe_scheitern() {
        let filter = MatchFilter {
            interests: vec!["musik".into(), "filme".into()],
            ..Default::default()
        };
        let mut b = sitzung(None, None, None);
        assert!(!filter_erfuellt(&filter, &b, MIN));

        b.interests = vec!["sport".into()];
        assert!(!filter_erfuellt(&filter, &b, MIN));

        b.interests.push("filme".into());
        assert!(filter_erfuellt(&filter, &b, MIN));
    }

    #[test]
    fn nur_verifizierte_braucht_mindest_reputation() {
        let filter = MatchFilter {
            only_verified: true,
            ..Default::default()
        };
        let mut b = sitzung(None, None, None);
        b.reputation = 80;
        assert!(filter_erfuellt(&filter, &b, MIN));
        b.reputation = 79;
        assert!(!filter_erfuellt(&filter, &b, MIN));
    }

    #[test]
    fn kompatibilitaet_ist_bidirektional() {
        // A hat keinen Filter, B will nur Maenner zwischen 18 und 30
        let a = sitzung(Some(Gender::Male), Some(25), None);
        let b = sitzung(Some(Gender::Female), None, None);
        let filter_b = MatchFilter {
            gender: Some(GenderFilter::Male),
            age_range: Some(AgeRange { min: 18, max: 30 }),
            ..Default::default()
        };
        assert!(kompatibel(&a, None, &b, Some(&filter_b), MIN));

        // Gleiches Paar, aber A will Frauen ueber 30: B hat kein Alter -> nur Geschlecht zaehlt
        let filter_a = MatchFilter {
            gender: Some(GenderFilter::Female),
            age_range: Some(AgeRange { min: 31, max: 99 }),
            ..Default::default()
        };
        assert!(kompatibel(&a, Some(&filter_a), &b, Some(&filter_b), MIN));

        // A ist zu alt fuer B
        let a_alt = sitzung(Some(Gender::Male), Some(45), None);
        assert!(!kompatibel(&a_alt, None, &b, Some(&filter_b), MIN));
        assert!(!kompatibel(&b, Some(&filter_b), &a_alt, None, MIN));
    }
}
