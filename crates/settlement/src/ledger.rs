//! Ticket ledger for per-channel micropayment bookkeeping
//!
//! Accumulates acknowledged tickets per channel, enforcing epoch
//! monotonicity (replay protection) and the channel's deposit ceiling.
//! The ledger exclusively owns its ticket sets; callers serialize access
//! per channel while distinct channels may be processed in parallel.

use std::collections::HashMap;

use tracing::{debug, warn};

use mixcraft_core::{
    AccountEntry, Balance, ChannelId, Id, MixCraftError, Result, SignedTicket,
};
use mixcraft_crypto::verify_ticket;

/// Per-channel bookkeeping state
struct ChannelBook {
    account: AccountEntry,
    /// Deposit still available to back new tickets
    remaining: Balance,
    tickets: Vec<SignedTicket>,
    /// Running sum of accepted ticket amounts
    total: Balance,
}

/// Accepted tickets and their sum for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct TicketAggregate {
    /// Challenge and amount of every accepted ticket, in acceptance order
    pub tickets: Vec<(Id, Balance)>,
    pub total: Balance,
}

/// Ledger of signed tickets across all open channels
pub struct TicketLedger {
    channels: HashMap<ChannelId, ChannelBook>,
}

impl TicketLedger {
    pub fn new() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Start tracking a channel with its on-chain account entry and deposit.
    pub fn open_channel(
        &mut self,
        channel_id: ChannelId,
        account: AccountEntry,
        deposit: Balance,
    ) -> Result<()> {
        if self.channels.contains_key(&channel_id) {
            return Err(MixCraftError::ChannelAlreadyOpen(channel_id.to_string()));
        }

        debug!(channel = %channel_id, %deposit, "tracking channel");
        self.channels.insert(
            channel_id,
            ChannelBook {
                account,
                remaining: deposit,
                tickets: Vec::new(),
                total: Balance::zero(deposit.kind()),
            },
        );
        Ok(())
    }

    /// Apply a newer on-chain account entry for a channel.
    ///
    /// Rejected when the entry does not supersede the stored one; the
    /// counter never moves backwards.
    pub fn update_account(&mut self, channel_id: ChannelId, account: AccountEntry) -> Result<()> {
        let book = self
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| MixCraftError::ChannelNotFound(channel_id.to_string()))?;

        if !account.supersedes(&book.account) {
            return Err(MixCraftError::StaleAccountEntry(channel_id.to_string()));
        }

        book.account = account;
        Ok(())
    }

    /// Record an acknowledged ticket against its channel.
    ///
    /// Validation order: channel known, signature valid, epoch strictly
    /// greater than the channel counter, amount within the remaining
    /// deposit. A rejected ticket never mutates the channel; repeated
    /// invalid tickets signal a misbehaving counterparty and are logged.
    pub fn record_ticket(&mut self, channel_id: ChannelId, ticket: SignedTicket) -> Result<()> {
        let book = self
            .channels
            .get_mut(&channel_id)
            .ok_or_else(|| MixCraftError::ChannelNotFound(channel_id.to_string()))?;

        if !verify_ticket(&ticket) {
            warn!(channel = %channel_id, "rejecting ticket with bad signature");
            return Err(MixCraftError::InvalidTicket("bad signature".to_string()));
        }

        if ticket.epoch <= book.account.counter {
            warn!(
                channel = %channel_id,
                epoch = ticket.epoch,
                counter = book.account.counter,
                "rejecting replayed or stale ticket"
            );
            return Err(MixCraftError::InvalidTicket(format!(
                "stale epoch {} (counter {})",
                ticket.epoch, book.account.counter
            )));
        }

        if ticket.amount.gt(&book.remaining) {
            warn!(channel = %channel_id, amount = %ticket.amount, "rejecting over-balance ticket");
            return Err(MixCraftError::InvalidTicket(format!(
                "amount {} exceeds remaining balance {}",
                ticket.amount, book.remaining
            )));
        }

        book.remaining = book.remaining.checked_sub(&ticket.amount)?;
        book.total = book.total.checked_add(&ticket.amount)?;
        book.account.counter = ticket.epoch;

        debug!(
            channel = %channel_id,
            amount = %ticket.amount,
            epoch = ticket.epoch,
            total = %book.total,
            "recorded ticket"
        );
        book.tickets.push(ticket);
        Ok(())
    }

    /// Aggregate every accepted ticket for a channel.
    ///
    /// The total is recomputed from the ticket set, so it holds no matter
    /// how the running sum was maintained.
    pub fn aggregate(&self, channel_id: ChannelId) -> Result<TicketAggregate> {
        let book = self
            .channels
            .get(&channel_id)
            .ok_or_else(|| MixCraftError::ChannelNotFound(channel_id.to_string()))?;

        let mut total = Balance::zero(book.total.kind());
        let mut tickets = Vec::with_capacity(book.tickets.len());
        for ticket in &book.tickets {
            total = total.checked_add(&ticket.amount)?;
            tickets.push((ticket.challenge, ticket.amount));
        }

        Ok(TicketAggregate { tickets, total })
    }

    /// Whether the channel's aggregate value makes an on-chain redemption
    /// worth its gas cost.
    pub fn redeemable(&self, channel_id: ChannelId, threshold: &Balance) -> bool {
        self.channels
            .get(&channel_id)
            .map(|book| book.total.ge(threshold) && !book.total.is_zero())
            .unwrap_or(false)
    }

    /// The channel's remaining deposit available to back new tickets.
    pub fn remaining_balance(&self, channel_id: ChannelId) -> Option<Balance> {
        self.channels.get(&channel_id).map(|book| book.remaining)
    }

    /// The stored account entry for a channel.
    pub fn account(&self, channel_id: ChannelId) -> Option<AccountEntry> {
        self.channels.get(&channel_id).map(|book| book.account)
    }

    /// Retire a channel after its on-chain closure, returning the matured
    /// tickets for redemption.
    pub fn close_channel(&mut self, channel_id: ChannelId) -> Result<Vec<SignedTicket>> {
        let book = self
            .channels
            .remove(&channel_id)
            .ok_or_else(|| MixCraftError::ChannelNotFound(channel_id.to_string()))?;

        debug!(channel = %channel_id, tickets = book.tickets.len(), "retiring channel");
        Ok(book.tickets)
    }

    pub fn contains(&self, channel_id: ChannelId) -> bool {
        self.channels.contains_key(&channel_id)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for TicketLedger {
    fn default() -> Self {
        Self::new()
    }
}
