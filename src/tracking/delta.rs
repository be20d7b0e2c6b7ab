use crate::db::PlayerRecord;

/// Fields written back after a successful poll of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterUpdate {
    pub trophies: i64,
    pub offense_trophies: i64,
    pub offense_attacks: i64,
    pub defense_trophies: i64,
    pub defense_defenses: i64,
}

/// Fold a freshly fetched trophy count into the period counters of `previous`.
///
/// Every poll counts as one attack and one defense opportunity whatever the
/// sign of the change, so an unchanged count still bumps both counters.
pub fn accumulate(previous: &PlayerRecord, fresh_trophies: i64) -> CounterUpdate {
    let diff = fresh_trophies - previous.trophies;

    CounterUpdate {
        trophies: fresh_trophies,
        offense_trophies: previous.offense_trophies + diff.max(0),
        offense_attacks: previous.offense_attacks + 1,
        defense_trophies: previous.defense_trophies + (-diff).max(0),
        defense_defenses: previous.defense_defenses + 1,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(trophies: i64) -> PlayerRecord {
        PlayerRecord {
            id: 1,
            player_tag: "AAA".into(),
            name: "Alpha".into(),
            linked_user_id: Some(1),
            trophies,
            prev_trophies: trophies,
            offense_trophies: 0,
            offense_attacks: 0,
            defense_trophies: 0,
            defense_defenses: 0,
            last_reset: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            version: 0,
        }
    }

    #[test]
    fn gain_goes_to_offense() {
        let update = accumulate(&record(4000), 4050);

        assert_eq!(
            update,
            CounterUpdate {
                trophies: 4050,
                offense_trophies: 50,
                offense_attacks: 1,
                defense_trophies: 0,
                defense_defenses: 1,
            }
        );
    }

    #[test]
    fn loss_goes_to_defense() {
        let mut previous = record(4000);
        previous.offense_trophies = 30;
        previous.offense_attacks = 2;
        previous.defense_trophies = 10;
        previous.defense_defenses = 2;

        let update = accumulate(&previous, 3968);

        assert_eq!(update.trophies, 3968);
        assert_eq!(update.offense_trophies, 30);
        assert_eq!(update.offense_attacks, 3);
        assert_eq!(update.defense_trophies, 42);
        assert_eq!(update.defense_defenses, 3);
    }

    #[test]
    fn unchanged_count_bumps_both_counters_only() {
        let mut current = record(4000);

        for polls in 1..=3 {
            let update = accumulate(&current, 4000);
            current.trophies = update.trophies;
            current.offense_trophies = update.offense_trophies;
            current.offense_attacks = update.offense_attacks;
            current.defense_trophies = update.defense_trophies;
            current.defense_defenses = update.defense_defenses;

            assert_eq!(current.offense_attacks, polls);
            assert_eq!(current.defense_defenses, polls);
        }

        assert_eq!(current.offense_trophies, 0);
        assert_eq!(current.defense_trophies, 0);
        assert_eq!(current.trophies, 4000);
    }
}
