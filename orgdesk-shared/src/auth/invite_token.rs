/// Invite tokens
///
/// Format: `inv_` followed by 32 base62 characters (36 chars total), drawn
/// from `rand::thread_rng()`. The token is the only credential an invitee
/// presents, together with their verified email.
///
/// ```
/// use orgdesk_shared::auth::invite_token::{generate_invite_token, is_well_formed, TOKEN_LENGTH};
///
/// let token = generate_invite_token();
/// assert_eq!(token.len(), TOKEN_LENGTH);
/// assert!(is_well_formed(&token));
/// assert!(!is_well_formed("inv_short"));
/// ```

use rand::Rng;

const TOKEN_PREFIX: &str = "inv_";

const TOKEN_RANDOM_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Total token length, prefix included
pub const TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH;

/// Generates a fresh invite token
pub fn generate_invite_token() -> String {
    let mut rng = rand::thread_rng();
    let random_part: String = (0..TOKEN_RANDOM_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    format!("{}{}", TOKEN_PREFIX, random_part)
}

/// Checks prefix, length and alphabet without touching the store
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .strip_prefix(TOKEN_PREFIX)
            .is_some_and(|rest| rest.bytes().all(|b| b.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| generate_invite_token()).collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("inv_"));
        assert!(!is_well_formed("abc_abcdefghijklmnopqrstuvwxyz123456"));
        assert!(!is_well_formed("inv_abcdefghijklmnopqrstuvwxyz12345!"));
        assert!(!is_well_formed("inv_abcdefghijklmnopqrstuvwxyz1234567"));
        assert!(is_well_formed("inv_abcdefghijklmnopqrstuvwxyz123456"));
    }
}
