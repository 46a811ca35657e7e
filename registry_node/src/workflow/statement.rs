//! Consent statement derivation
//!
//! The statement the seller must read on camera is a pure function of the
//! transaction record. It is regenerated every time it is needed and never
//! persisted, so the verifier always judges the video against exactly the
//! terms on the record at that moment.

use crate::ledger::SaleTransaction;

/// Mask an identifier down to `XX` plus its last four characters
pub fn mask_id(id: &str) -> String {
    let tail: String = id
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("XX{}", tail)
}

/// Format a rupee amount with Indian digit grouping (12,34,567)
pub fn format_rupees(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut grouped = Vec::new();
    let head_chars: Vec<char> = head.chars().collect();
    let mut i = head_chars.len();
    while i > 2 {
        grouped.push(head_chars[i - 2..i].iter().collect::<String>());
        i -= 2;
    }
    grouped.push(head_chars[..i].iter().collect::<String>());
    grouped.reverse();
    format!("{},{}", grouped.join(","), tail)
}

/// Derive the consent statement for a transaction
pub fn consent_statement(tx: &SaleTransaction) -> String {
    format!(
        "I, {seller}, with ID number ending in {masked}, hereby consent to sell \
         my property located at {address} to {buyer} for the agreed amount of \
         \u{20B9}{price}. I confirm that I am the legal owner of this property and \
         have the right to transfer ownership. This transaction is being conducted \
         with my full knowledge and consent, without any coercion or misrepresentation.",
        seller = tx.seller_name,
        masked = mask_id(&tx.seller_id),
        address = tx.property_address,
        buyer = tx.buyer_name,
        price = format_rupees(tx.sale_price),
    )
}
