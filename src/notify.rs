//! Notification facade
//!
//! Slack webhooks for the four operator channels (errors, printed txs,
//! opportunities, snipes) plus optional Twilio SMS for the events worth
//! waking someone up for. Everything here is fire-and-forget: a sink
//! failure is logged and never propagates into the trading loop.
//!
//! Author: AI-Generated
//! Created: 2026-07-13

use serde_json::json;
use tracing::{error, info, warn};

use crate::config::{Config, SlackWebhooks, TwilioConfig};
use crate::types::{ArbitragePlan, Token};

pub struct Notifier {
    client: reqwest::Client,
    slack: SlackWebhooks,
    twilio: Option<TwilioConfig>,
}

impl Notifier {
    pub fn new(config: &Config) -> Self {
        if config.twilio.is_none() {
            warn!("TWILIO_* not set - SMS notifications disabled");
        }
        Self {
            client: reqwest::Client::new(),
            slack: config.slack.clone(),
            twilio: config.twilio.clone(),
        }
    }

    pub async fn send_error(&self, message: &str) {
        error!("{message}");
        let text = format!(":red_circle:\n{message}");
        self.post_slack(&self.slack.errors, &text).await;
    }

    pub async fn send_opportunity(&self, message: &str) {
        self.post_slack(&self.slack.opportunities, message).await;
    }

    /// Outcome of a submitted printer transaction, with its explorer URL.
    pub async fn send_printing_tx(&self, tx_url: &str, success: bool) {
        let text = if success {
            info!("Transaction executed {tx_url}");
            format!(
                ":money_with_wings::money_with_wings::money_with_wings:\nTransaction executed {tx_url}"
            )
        } else {
            warn!("Transaction was processed but failed {tx_url}");
            format!(":red_circle::red_circle::red_circle:\nTransaction was processed but failed {tx_url}")
        };
        self.post_slack(&self.slack.printing_tx, &text).await;
    }

    pub async fn send_snipe(&self, message: &str) {
        self.post_slack(&self.slack.snipe, message).await;
    }

    /// Printed-money announcement: Slack plus SMS to every agent.
    pub async fn send_all(&self, message: &str) {
        self.post_slack(&self.slack.printing_tx, message).await;
        self.send_sms(message).await;
    }

    /// Liveness ping on the errors channel.
    pub async fn heartbeat(&self, strategy: &str, block: u64) {
        self.post_slack(
            &self.slack.errors,
            &format!(
                ":heartbeat: {strategy} alive at block {block} ({})",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
            ),
        )
        .await;
    }

    async fn post_slack(&self, webhook: &str, text: &str) {
        let result = self
            .client
            .post(webhook)
            .json(&json!({ "text": text }))
            .send()
            .await;
        if let Err(e) = result {
            warn!("slack webhook post failed: {e}");
        }
    }

    async fn send_sms(&self, message: &str) {
        let Some(twilio) = &self.twilio else { return };
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            twilio.account_sid
        );
        for number in &twilio.agent_numbers {
            let result = self
                .client
                .post(&url)
                .basic_auth(&twilio.account_sid, Some(&twilio.auth_token))
                .form(&[
                    ("To", number.as_str()),
                    ("From", twilio.from_number.as_str()),
                    ("Body", message),
                ])
                .send()
                .await;
            if let Err(e) = result {
                warn!("twilio send to {number} failed: {e}");
            }
        }
    }
}

/// Full opportunity report for the Slack channel: route with per-leg
/// amounts, optimal input, gas assumptions, deadline and revert bounds.
pub fn format_opportunity(
    plan: &ArbitragePlan,
    weth: &Token,
    latest_block: u64,
    consecutive: Option<u32>,
) -> String {
    let mut route = format!(
        "{} {} ({})",
        weth.from_wei(plan.amount_in),
        plan.path.legs[0].token_in.name,
        plan.path.legs[0].pool.kind
    );
    for (leg, out) in plan.path.legs.iter().zip(&plan.amount_outs) {
        route.push_str(&format!(
            " -> {} {} ({})",
            leg.token_out.from_wei(*out),
            leg.token_out.name,
            leg.pool.kind
        ));
    }

    let min_outs: Vec<String> = plan
        .min_amount_outs
        .iter()
        .map(|m| m.to_string())
        .collect();

    let mut message = format!(
        "{}\nOpportunity: *{}* ETH :moneybag:\nPath: {}\nAmount in: {} ETH\nGas Price: {} Gwei\nGas Execution: {} ETH\nCurrent Block: {} (Max: {})\nMin Amount out: [{}]\n",
        beers(weth.from_wei(plan.profit)),
        weth.from_wei(plan.profit),
        route,
        weth.from_wei(plan.amount_in),
        plan.gas_price / 1_000_000_000,
        weth.from_wei(plan.gas_cost),
        latest_block,
        plan.max_block_height,
        min_outs.join(", "),
    );
    if let Some(count) = consecutive {
        message.push_str(&format!("Consecutive Arbitrage: {count}\n"));
    }
    message
}

/// Emoji emphasis scaled by the profit bucket.
fn beers(profit_eth: f64) -> String {
    let times = if profit_eth >= 2.0 {
        20
    } else if profit_eth >= 1.5 {
        10
    } else if profit_eth >= 1.0 {
        5
    } else if profit_eth > 0.5 {
        2
    } else {
        1
    };
    ":beer:".repeat(times)
}
