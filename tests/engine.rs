use minecasino::games::baccarat::{BaccaratCall, BaccaratParams, DrawRule};
use minecasino::games::dice::{DiceParams, win_multiplier};
use minecasino::games::slots::{SlotParams, SlotSpin, SlotTheme, ThemeId, score};
use minecasino::games::wheel::STANDARD_SEGMENTS;
use minecasino::games::{EdgePolicy, GameId, GameParams, OutcomeDetail, resolve_round};
use minecasino::rng::{ScriptedSource, seeded};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

const TRIALS: usize = 100_000;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn playable() -> impl Strategy<Value = GameParams> {
    prop_oneof![
        (2u32..=98).prop_map(|target| GameParams::Dice(DiceParams { target })),
        Just(GameParams::default_for(GameId::Crash)),
        prop::sample::select(ThemeId::ALL.to_vec()).prop_map(|id| GameParams::Slots(SlotParams {
            theme: SlotTheme::builtin(id),
        })),
        Just(GameParams::default_for(GameId::Wheel)),
        (
            prop::sample::select(vec![
                BaccaratCall::Player,
                BaccaratCall::Banker,
                BaccaratCall::Tie
            ]),
            prop::bool::ANY
        )
            .prop_map(|(call, tableau)| GameParams::Baccarat(BaccaratParams {
                call,
                rule: if tableau { DrawRule::Tableau } else { DrawRule::TwoCard },
            })),
        Just(GameParams::default_for(GameId::Blackjack)),
        Just(GameParams::default_for(GameId::Scratch)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]
    #[test]
    fn payout_is_never_negative_and_follows_the_table(
        params in playable(),
        stake in 0.01f64..10_000.0,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let settlement = resolve_round(&params, stake, &EdgePolicy::default(), &mut rng).unwrap();
        prop_assert!(settlement.payout >= 0.0);
        prop_assert!(settlement.payout.is_finite());
        // the edge layer can only zero a payout, never change its size
        prop_assert!(settlement.payout == 0.0 || close(settlement.payout, settlement.raw_payout));

        let ratio = settlement.raw_payout / stake;
        match (&params, &settlement.detail) {
            (GameParams::Wheel(_), OutcomeDetail::Wheel(_)) => {
                prop_assert!(STANDARD_SEGMENTS.iter().any(|m| close(*m, ratio)));
            }
            (GameParams::Baccarat(_), OutcomeDetail::Baccarat(coup)) => {
                prop_assert!(coup.player_value <= 9 && coup.banker_value <= 9);
                prop_assert!([0.0, 2.0, 9.0].iter().any(|m| close(*m, ratio)));
            }
            (GameParams::Blackjack(_), OutcomeDetail::Blackjack(_)) => {
                prop_assert!([0.0, 1.0, 2.0].iter().any(|m| close(*m, ratio)));
            }
            (GameParams::Slots(p), OutcomeDetail::Slots(spin)) => {
                let expected: f64 = spin.wins.iter().map(|w| p.theme.multiplier(w.symbol)).sum();
                prop_assert!((ratio - expected).abs() < 1e-6);
            }
            (GameParams::Dice(p), OutcomeDetail::Dice(roll)) => {
                let expected = if roll.is_win() { win_multiplier(p.target) } else { 0.0 };
                prop_assert!((ratio - expected).abs() < 1e-6);
            }
            (GameParams::Crash(p), OutcomeDetail::Crash(run)) => {
                prop_assert!(run.crash_point >= 1.0);
                prop_assert!(ratio == 0.0 || (ratio - p.cash_out).abs() < 1e-6);
            }
            (GameParams::Scratch(_), OutcomeDetail::Scratch(card)) => {
                let expected: f64 = card.groups().iter().map(|(s, _)| s.value()).sum();
                prop_assert!((ratio - expected).abs() < 1e-6);
            }
            (params, detail) => prop_assert!(false, "{:?} produced {:?}", params, detail),
        }
    }
}

#[test]
fn dice_win_rate_tracks_target() {
    let mut rng = seeded("dice-rate");
    for target in [2u32, 25, 50, 75, 98] {
        let params = GameParams::Dice(DiceParams { target });
        let wins = (0..TRIALS)
            .filter(|_| {
                resolve_round(&params, 1.0, &EdgePolicy::fair(), &mut rng)
                    .unwrap()
                    .payout
                    > 0.0
            })
            .count();
        let rate = wins as f64 / TRIALS as f64;
        let expected = (100 - target) as f64 / 100.0;
        assert!(
            (rate - expected).abs() < 0.01,
            "target {target}: rate {rate} vs {expected}"
        );
    }
}

fn baccarat_shares(rule: DrawRule, phrase: &str) -> (f64, f64, f64) {
    let mut rng = seeded(phrase);
    let params = GameParams::Baccarat(BaccaratParams {
        call: BaccaratCall::Player,
        rule,
    });
    let (mut player, mut banker, mut tie) = (0usize, 0usize, 0usize);
    for _ in 0..TRIALS {
        let settlement = resolve_round(&params, 1.0, &EdgePolicy::fair(), &mut rng).unwrap();
        let OutcomeDetail::Baccarat(coup) = settlement.detail else {
            panic!("not a baccarat coup");
        };
        match coup.winner {
            BaccaratCall::Player => player += 1,
            BaccaratCall::Banker => banker += 1,
            BaccaratCall::Tie => tie += 1,
        }
    }
    let n = TRIALS as f64;
    (player as f64 / n, banker as f64 / n, tie as f64 / n)
}

#[test]
fn tableau_baccarat_converges_to_punto_banco_odds() {
    let (player, banker, tie) = baccarat_shares(DrawRule::Tableau, "tableau");
    assert!((player - 0.4462).abs() < 0.01, "player {player}");
    assert!((banker - 0.4586).abs() < 0.01, "banker {banker}");
    assert!((tie - 0.0952).abs() < 0.01, "tie {tie}");
}

#[test]
fn two_card_baccarat_is_symmetric() {
    let (player, banker, tie) = baccarat_shares(DrawRule::TwoCard, "two-card");
    assert!((player - banker).abs() < 0.015, "player {player} banker {banker}");
    assert!((tie - 0.1026).abs() < 0.01, "tie {tie}");
}

#[test]
fn slot_row_pays_theme_multiplier_times_stake() {
    let theme = SlotTheme::builtin(ThemeId::NeonMatrix);
    let mut grid = [[0usize; 3]; 5];
    for (reel, column) in grid.iter_mut().enumerate() {
        column[0] = 1 + reel % 2;
        column[1] = if reel < 4 { 4 } else { 2 };
        column[2] = reel;
    }
    let spin = SlotSpin {
        wins: score(&grid),
        grid,
    };
    assert_eq!(spin.wins.len(), 1);
    assert_eq!(spin.wins[0].row, 1);
    assert_eq!(spin.wins[0].run, 4);
    assert!(close(spin.payout(&theme, 10.0), 10.0 * theme.multiplier(4)));
}

#[test]
fn reversal_halves_slot_wins() {
    let mut rng = seeded("slots-edge");
    let params = GameParams::Slots(SlotParams::default());
    let edge = EdgePolicy::house(0.5).unwrap();
    let (mut raw_wins, mut kept) = (0usize, 0usize);
    for _ in 0..TRIALS {
        let settlement = resolve_round(&params, 1.0, &edge, &mut rng).unwrap();
        if settlement.raw_payout > 0.0 {
            raw_wins += 1;
            if settlement.payout > 0.0 {
                kept += 1;
            }
        }
    }
    assert!(raw_wins > 1_000);
    let rate = kept as f64 / raw_wins as f64;
    assert!((rate - 0.5).abs() < 0.04, "kept {rate}");
}

#[test]
fn dice_hundred_on_fifty() {
    let params = GameParams::Dice(DiceParams { target: 50 });
    let edge = EdgePolicy::default();

    let win = resolve_round(&params, 100.0, &edge, &mut ScriptedSource::new(vec![0.505])).unwrap();
    let OutcomeDetail::Dice(roll) = win.detail else {
        panic!("not a dice roll");
    };
    assert_eq!(roll.roll, 51);
    assert!(close(win.payout, 198.0));

    let loss = resolve_round(&params, 100.0, &edge, &mut ScriptedSource::new(vec![0.495])).unwrap();
    let OutcomeDetail::Dice(roll) = loss.detail else {
        panic!("not a dice roll");
    };
    assert_eq!(roll.roll, 50);
    assert_eq!(loss.payout, 0.0);
}
