//! Scoring Rules - Single Immutable Source of Truth
//!
//! Every weight, selector, pattern and threshold used by the detectors and
//! the aggregator lives here, frozen under a version tag. Changing any value
//! means introducing a new version constant; rules are never mutated in
//! place, so identical inputs always reproduce identical reports.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::types::{Category, Severity};

/// Current rules version, stamped into nothing but logs; bump on any change.
pub const RULES_VERSION: &str = "v1";

// ============================================
// CANONICAL DETECTION FIELD KEYS
// ============================================

/// The ~33 canonical check keys across the seven categories.
pub mod fields {
    // honeypot
    pub const CAN_BLACKLIST: &str = "can_blacklist";
    pub const WHITELIST_GATING: &str = "whitelist_gating";
    pub const TRANSFER_PAUSABLE: &str = "transfer_pausable";
    pub const TRADING_COOLDOWN: &str = "trading_cooldown";
    pub const FAKE_TOKEN: &str = "fake_token";
    // rug pull
    pub const CAN_MINT: &str = "can_mint";
    pub const SELF_DESTRUCT: &str = "self_destruct";
    pub const EXTERNAL_DELEGATECALL: &str = "external_delegatecall";
    pub const PROXY_CONTRACT: &str = "proxy_contract";
    pub const OWNER_CHANGE_BALANCE: &str = "owner_change_balance";
    pub const IS_OPEN_SOURCE: &str = "is_open_source";
    // ownership
    pub const CAN_TRANSFER_OWNERSHIP: &str = "can_transfer_ownership";
    pub const RENOUNCED_OWNERSHIP: &str = "renounced_ownership";
    pub const HIDDEN_OWNER: &str = "hidden_owner";
    // tax
    pub const MUTABLE_TAX: &str = "mutable_tax";
    pub const FEE_ON_TRANSFER: &str = "fee_on_transfer";
    // flash loan
    pub const SPOT_PRICE_ORACLE: &str = "spot_price_oracle";
    pub const TWAP_ORACLE: &str = "twap_oracle";
    pub const FLASH_LOAN_CALLBACK: &str = "flash_loan_callback";
    pub const UNPROTECTED_CALLBACK: &str = "unprotected_callback";
    pub const REENTRANCY_GUARD: &str = "reentrancy_guard";
    pub const RESERVE_DIVISION: &str = "reserve_division";
    // mev
    pub const MUTABLE_FEES: &str = "mutable_fees";
    pub const NO_TRADING_COOLDOWN: &str = "no_trading_cooldown";
    pub const APPROVE_RACE_WINDOW: &str = "approve_race_window";
    pub const ANTI_BOT: &str = "anti_bot";
    pub const MAX_TX_LIMIT: &str = "max_tx_limit";
    pub const DEX_INTEGRATED: &str = "dex_integrated";
    pub const FEE_ON_TRANSFER_SWAP: &str = "fee_on_transfer_swap";
    pub const BOT_INFRASTRUCTURE: &str = "bot_infrastructure";
    pub const LP_PAIR_PRESENT: &str = "lp_pair_present";
    // liquidity
    pub const TOP_HOLDER_CONCENTRATION: &str = "top_holder_concentration";
    pub const TOP5_HOLDER_CONCENTRATION: &str = "top5_holder_concentration";
    pub const LOW_HOLDER_COUNT: &str = "low_holder_count";
    pub const WASH_TRADING: &str = "wash_trading";
    pub const DUPLICATE_AMOUNT_PATTERN: &str = "duplicate_amount_pattern";
    pub const HIGH_FREQUENCY_TRADING: &str = "high_frequency_trading";
}

// ============================================
// RULE SHAPES
// ============================================

/// One 4-byte selector to look for in raw bytecode. Presence proves the
/// function is exported, not that it is reachable or currently enabled.
#[derive(Debug, Clone)]
pub struct SelectorRule {
    /// 8 lowercase hex chars, no 0x prefix
    pub selector: &'static str,
    pub name: &'static str,
    pub field: &'static str,
    pub category: Category,
    pub severity: Severity,
    pub weight: i32,
}

/// One regex to match against verified source text. A field matched by
/// several rules, or a rule matching several times, contributes its weight
/// exactly once.
#[derive(Debug)]
pub struct SourceRule {
    pub pattern: Regex,
    pub name: &'static str,
    pub field: &'static str,
    pub category: Category,
    pub severity: Severity,
    pub weight: i32,
}

/// Canonical overall-risk blend. Coefficients sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct BlendWeights {
    pub contract_overall: f64,
    pub honeypot: f64,
    pub rug_pull: f64,
    pub flash_loan: f64,
    pub mev: f64,
    pub illiquidity: f64,
}

/// Composite category score mixes (aggregator combination rules)
#[derive(Debug, Clone, Copy)]
pub struct CompositionWeights {
    pub contract_bytecode: f64,
    pub contract_source: f64,
    pub honeypot_contract: f64,
    pub honeypot_creator: f64,
    pub rug_contract: f64,
    pub rug_creator: f64,
    pub rug_illiquidity: f64,
}

/// Tiered thresholds for the liquidity concentration analyzer
#[derive(Debug, Clone, Copy)]
pub struct LiquidityWeights {
    pub top1_critical_pct: f64,
    pub top1_critical: i32,
    pub top1_high_pct: f64,
    pub top1_high: i32,
    pub top1_medium_pct: f64,
    pub top1_medium: i32,
    pub top5_critical_pct: f64,
    pub top5_critical: i32,
    pub top5_high_pct: f64,
    pub top5_high: i32,
    pub min_holder_count: usize,
    pub low_holder_count: i32,
    pub wash_trading: i32,
    pub wash_pair_repeats: usize,
    pub wash_pair_threshold: usize,
    pub duplicate_amounts: i32,
    pub duplicate_amount_repeats: usize,
    pub high_frequency: i32,
    pub high_frequency_tx_per_hour: f64,
    pub holder_mix: f64,
    pub transfer_mix: f64,
}

/// Creator wallet profiling weights
#[derive(Debug, Clone, Copy)]
pub struct CreatorWeights {
    pub age_lt_7d: i32,
    pub age_lt_30d: i32,
    pub age_gt_365d: i32,
    pub deployed_gt_20: i32,
    pub deployed_gt_10: i32,
    pub deployed_gt_5: i32,
    pub low_balance_native: f64,
    pub low_balance: i32,
}

/// MEV exposure weights
#[derive(Debug, Clone, Copy)]
pub struct MevWeights {
    pub mutable_fees: i32,
    pub no_cooldown: i32,
    pub approve_race: i32,
    pub anti_bot: i32,
    pub max_tx: i32,
    pub per_dex_swap: i32,
    pub fee_on_transfer_swap: i32,
    pub bot_infrastructure: i32,
    pub lp_pair: i32,
}

/// Flash-loan exposure severity weights
#[derive(Debug, Clone, Copy)]
pub struct FlashLoanWeights {
    pub vulnerable_oracle: i32,
    pub unprotected_callback: i32,
    pub reserve_division: i32,
}

/// The full immutable rule set for one version
pub struct ScoringRules {
    pub version: &'static str,
    pub selector_rules: Vec<SelectorRule>,
    pub source_rules: Vec<SourceRule>,
    /// Deceptive prefixes for fake-token detection
    pub deceptive_prefixes: Vec<&'static str>,
    /// Canonical asset symbols a fake token impersonates
    pub canonical_symbols: Vec<&'static str>,
    /// Penalty applied when no verified source is available
    pub unverified_source_penalty: i32,
    pub blend: BlendWeights,
    pub composition: CompositionWeights,
    pub liquidity: LiquidityWeights,
    pub creator: CreatorWeights,
    pub mev: MevWeights,
    pub flash_loan: FlashLoanWeights,
}

// ============================================
// WELL-KNOWN SELECTORS (shared with detectors)
// ============================================

/// approve(address,uint256)
pub const SEL_APPROVE: &str = "095ea7b3";
/// increaseAllowance(address,uint256)
pub const SEL_INCREASE_ALLOWANCE: &str = "39509351";
/// setCooldownEnabled(bool)
pub const SEL_SET_COOLDOWN: &str = "5932ead1";

/// Selectors that mutate fee schedules after deployment
pub const MUTABLE_FEE_SELECTORS: [&str; 3] = [
    "061c82d0", // setTaxFeePercent(uint256)
    "8a7234c6", // setFees(uint256)
    "8ee88c53", // setLiquidityFeePercent(uint256)
];

/// DEX swap entrypoints (standard variants)
pub const DEX_SWAP_SELECTORS: [&str; 3] = [
    "38ed1739", // swapExactTokensForTokens
    "7ff36ab5", // swapExactETHForTokens
    "18cbafe5", // swapExactTokensForETH
];

/// DEX swap entrypoints (fee-on-transfer variants)
pub const FOT_SWAP_SELECTORS: [&str; 3] = [
    "5c11d795", // swapExactTokensForTokensSupportingFeeOnTransferTokens
    "b6f9de95", // swapExactETHForTokensSupportingFeeOnTransferTokens
    "791ac947", // swapExactTokensForETHSupportingFeeOnTransferTokens
];

/// Bot / batching / arbitrage infrastructure selectors
pub const BOT_INFRA_SELECTORS: [&str; 1] = [
    "ac9650d8", // multicall(bytes[])
];

/// Flash-loan entry callbacks
pub const FLASH_CALLBACK_SELECTORS: [&str; 3] = [
    "920f5c84", // executeOperation(address[],uint256[],uint256[],address,bytes)
    "10d1e85c", // uniswapV2Call(address,uint256,uint256,bytes)
    "23e30c8b", // onFlashLoan(address,address,uint256,uint256,bytes)
];

/// Spot-price read selectors (manipulable pricing references)
pub const SPOT_PRICE_SELECTORS: [&str; 2] = [
    "0902f1ac", // getReserves()
    "d06ca61f", // getAmountsOut(uint256,address[])
];

/// TWAP accumulator selectors (manipulation-resistant pricing references)
pub const TWAP_SELECTORS: [&str; 2] = [
    "5909c0d5", // price0CumulativeLast()
    "5a3d5493", // price1CumulativeLast()
];

/// LP pair introspection selectors
pub const LP_PAIR_SELECTORS: [&str; 2] = [
    "0dfe1681", // token0()
    "d21220a7", // token1()
];

fn v1_selector_rules() -> Vec<SelectorRule> {
    use fields::*;
    vec![
        SelectorRule {
            selector: "40c10f19", // mint(address,uint256)
            name: "mint",
            field: CAN_MINT,
            category: Category::RugPull,
            severity: Severity::Critical,
            weight: 30,
        },
        SelectorRule {
            selector: "0ecb93c0", // addBlackList(address)
            name: "addBlackList",
            field: CAN_BLACKLIST,
            category: Category::Honeypot,
            severity: Severity::Warning,
            weight: 25,
        },
        SelectorRule {
            selector: "f9f92be4", // blacklist(address)
            name: "blacklist",
            field: CAN_BLACKLIST,
            category: Category::Honeypot,
            severity: Severity::Warning,
            weight: 25,
        },
        SelectorRule {
            selector: "8456cb59", // pause()
            name: "pause",
            field: TRANSFER_PAUSABLE,
            category: Category::Honeypot,
            severity: Severity::Warning,
            weight: 20,
        },
        SelectorRule {
            selector: SEL_SET_COOLDOWN,
            name: "setCooldownEnabled",
            field: TRADING_COOLDOWN,
            category: Category::Honeypot,
            severity: Severity::Info,
            weight: 10,
        },
        SelectorRule {
            selector: "f2fde38b", // transferOwnership(address)
            name: "transferOwnership",
            field: CAN_TRANSFER_OWNERSHIP,
            category: Category::Ownership,
            severity: Severity::Info,
            weight: 5,
        },
        SelectorRule {
            selector: "061c82d0", // setTaxFeePercent(uint256)
            name: "setTaxFeePercent",
            field: MUTABLE_TAX,
            category: Category::Tax,
            severity: Severity::Warning,
            weight: 25,
        },
        SelectorRule {
            selector: "8a7234c6", // setFees(uint256)
            name: "setFees",
            field: MUTABLE_TAX,
            category: Category::Tax,
            severity: Severity::Warning,
            weight: 25,
        },
        SelectorRule {
            selector: "ec28438a", // setMaxTxAmount(uint256)
            name: "setMaxTxAmount",
            field: MAX_TX_LIMIT,
            category: Category::Mev,
            severity: Severity::Safe,
            weight: -10,
        },
    ]
}

fn v1_source_rules() -> Vec<SourceRule> {
    use fields::*;
    let rule = |pattern: &str,
                name: &'static str,
                field: &'static str,
                category: Category,
                severity: Severity,
                weight: i32| SourceRule {
        pattern: Regex::new(pattern).expect("static rule pattern"),
        name,
        field,
        category,
        severity,
        weight,
    };
    vec![
        rule(
            r"(?i)function\s+mint\s*\(",
            "mint function",
            CAN_MINT,
            Category::RugPull,
            Severity::Critical,
            30,
        ),
        rule(
            r"(?i)blacklist|isBlacklisted|_isSniper",
            "blacklist machinery",
            CAN_BLACKLIST,
            Category::Honeypot,
            Severity::Warning,
            25,
        ),
        rule(
            r"(?i)whitelist",
            "whitelist gating",
            WHITELIST_GATING,
            Category::Honeypot,
            Severity::Info,
            10,
        ),
        rule(
            r"(?i)whenNotPaused|Pausable",
            "pausable transfers",
            TRANSFER_PAUSABLE,
            Category::Honeypot,
            Severity::Warning,
            20,
        ),
        rule(
            r"(?i)cooldown",
            "trading cooldown",
            TRADING_COOLDOWN,
            Category::Honeypot,
            Severity::Info,
            10,
        ),
        rule(
            r"(?i)\bselfdestruct\s*\(",
            "selfdestruct",
            SELF_DESTRUCT,
            Category::RugPull,
            Severity::Critical,
            30,
        ),
        rule(
            r"(?i)\bdelegatecall\b",
            "delegatecall",
            EXTERNAL_DELEGATECALL,
            Category::RugPull,
            Severity::Warning,
            20,
        ),
        rule(
            r"(?i)upgradeTo|_setImplementation|TransparentUpgradeableProxy",
            "upgradeable proxy",
            PROXY_CONTRACT,
            Category::RugPull,
            Severity::Warning,
            15,
        ),
        rule(
            r"_balances\[[^\]]+\]\s*=[^=]",
            "direct balance assignment",
            OWNER_CHANGE_BALANCE,
            Category::RugPull,
            Severity::Critical,
            35,
        ),
        rule(
            r"(?i)hiddenOwner|_previousOwner",
            "hidden owner",
            HIDDEN_OWNER,
            Category::Ownership,
            Severity::Warning,
            20,
        ),
        rule(
            r"(?i)setTax|setFee|updateFee",
            "mutable tax",
            MUTABLE_TAX,
            Category::Tax,
            Severity::Warning,
            25,
        ),
        rule(
            r"(?i)swapAndLiquify|lockTheSwap|takeFee",
            "fee on transfer",
            FEE_ON_TRANSFER,
            Category::Tax,
            Severity::Info,
            10,
        ),
        rule(
            r"(?i)maxTxAmount|maxTransactionAmount",
            "max tx limit",
            MAX_TX_LIMIT,
            Category::Mev,
            Severity::Safe,
            -10,
        ),
        rule(
            r"(?i)antiBot|anti_bot|botBlacklist",
            "anti-bot guard",
            ANTI_BOT,
            Category::Mev,
            Severity::Safe,
            -15,
        ),
        rule(
            r"(?i)nonReentrant|ReentrancyGuard",
            "reentrancy guard",
            REENTRANCY_GUARD,
            Category::FlashLoan,
            Severity::Safe,
            -10,
        ),
    ]
}

impl ScoringRules {
    fn v1() -> Self {
        Self {
            version: RULES_VERSION,
            selector_rules: v1_selector_rules(),
            source_rules: v1_source_rules(),
            deceptive_prefixes: vec!["fake", "new", "super", "baby", "mini", "safe", "inu"],
            canonical_symbols: vec![
                "btc", "wbtc", "eth", "weth", "usdt", "usdc", "bnb", "dai", "doge", "shib",
                "pepe", "link", "uni", "matic", "sol", "ada", "xrp",
            ],
            unverified_source_penalty: 25,
            blend: BlendWeights {
                contract_overall: 0.20,
                honeypot: 0.25,
                rug_pull: 0.25,
                flash_loan: 0.10,
                mev: 0.10,
                illiquidity: 0.10,
            },
            composition: CompositionWeights {
                contract_bytecode: 0.5,
                contract_source: 0.5,
                honeypot_contract: 0.7,
                honeypot_creator: 0.3,
                rug_contract: 0.5,
                rug_creator: 0.3,
                rug_illiquidity: 0.2,
            },
            liquidity: LiquidityWeights {
                top1_critical_pct: 50.0,
                top1_critical: 40,
                top1_high_pct: 30.0,
                top1_high: 25,
                top1_medium_pct: 15.0,
                top1_medium: 10,
                top5_critical_pct: 80.0,
                top5_critical: 30,
                top5_high_pct: 60.0,
                top5_high: 15,
                min_holder_count: 10,
                low_holder_count: 25,
                wash_trading: 25,
                wash_pair_repeats: 5,
                wash_pair_threshold: 3,
                duplicate_amounts: 15,
                duplicate_amount_repeats: 5,
                high_frequency: 15,
                high_frequency_tx_per_hour: 100.0,
                holder_mix: 0.6,
                transfer_mix: 0.4,
            },
            creator: CreatorWeights {
                age_lt_7d: 30,
                age_lt_30d: 15,
                age_gt_365d: -10,
                deployed_gt_20: 30,
                deployed_gt_10: 15,
                deployed_gt_5: 5,
                low_balance_native: 0.01,
                low_balance: 15,
            },
            mev: MevWeights {
                mutable_fees: 25,
                no_cooldown: 15,
                approve_race: 10,
                anti_bot: -15,
                max_tx: -10,
                per_dex_swap: 10,
                fee_on_transfer_swap: 20,
                bot_infrastructure: 15,
                lp_pair: 5,
            },
            flash_loan: FlashLoanWeights {
                vulnerable_oracle: 35,
                unprotected_callback: 30,
                reserve_division: 20,
            },
        }
    }
}

lazy_static! {
    /// The active rule set. Loaded once, read everywhere, mutated never.
    pub static ref RULES: ScoringRules = ScoringRules::v1();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_weights_sum_to_one() {
        let b = RULES.blend;
        let sum = b.contract_overall + b.honeypot + b.rug_pull + b.flash_loan + b.mev + b.illiquidity;
        assert!((sum - 1.0).abs() < 1e-9, "blend sums to {}", sum);
    }

    #[test]
    fn test_composition_weights_sum_to_one() {
        let c = RULES.composition;
        assert!((c.contract_bytecode + c.contract_source - 1.0).abs() < 1e-9);
        assert!((c.honeypot_contract + c.honeypot_creator - 1.0).abs() < 1e-9);
        assert!((c.rug_contract + c.rug_creator + c.rug_illiquidity - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_selectors_are_canonical_hex() {
        for rule in &RULES.selector_rules {
            assert_eq!(rule.selector.len(), 8, "selector {}", rule.name);
            assert!(rule.selector.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(rule.selector, rule.selector.to_lowercase());
        }
    }

    #[test]
    fn test_source_rules_compile_and_match() {
        let rules = &RULES.source_rules;
        let mint_rule = rules.iter().find(|r| r.field == fields::CAN_MINT).unwrap();
        assert!(mint_rule.pattern.is_match("function mint(address to, uint256 amount)"));
        let guard_rule = rules
            .iter()
            .find(|r| r.field == fields::REENTRANCY_GUARD)
            .unwrap();
        assert!(guard_rule.pattern.is_match("modifier nonReentrant() {"));
        assert!(guard_rule.weight < 0);
    }

    #[test]
    fn test_negative_weights_marked_safe() {
        for rule in RULES.selector_rules.iter() {
            if rule.weight < 0 {
                assert_eq!(rule.severity, Severity::Safe, "{}", rule.name);
            }
        }
        for rule in RULES.source_rules.iter() {
            if rule.weight < 0 {
                assert_eq!(rule.severity, Severity::Safe, "{}", rule.name);
            }
        }
    }
}
