//! Server-rendered HTML. The landing page carries a small script that saves the payment destination
//! and starts production runs through the JSON API, and exposes the publishable key for the
//! processor's browser library.

use rocket::response::content::RawHtml;

pub fn login(error: Option<&str>) -> RawHtml<String> {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    layout(&format!(
        r#"{error}
<form method="post" action="/login">
  <input name="name" placeholder="Name">
  <input name="password" type="password" placeholder="Password">
  <button type="submit">Log in</button>
</form>
<form method="post" action="/register">
  <input name="name" placeholder="Name">
  <input name="password" type="password" placeholder="Password">
  <button type="submit">Register</button>
</form>"#
    ))
}

/// `balance` is `None` when it could not be loaded.
pub fn landing(name: &str, balance: Option<f64>, publishable_key: &str) -> RawHtml<String> {
    let balance = match balance {
        Some(balance) => format!(r#"<span id="balance">{:.2}</span> EUR"#, balance),
        None => r#"<span id="balance" class="error">unavailable, please reload</span>"#.to_owned(),
    };
    layout(&format!(
        r#"<p>Logged in as <strong>{name}</strong></p>
<p>Balance: {balance}</p>
<form id="payment" data-publishable-key="{key}">
  <input name="payment_method_id" placeholder="Payment method, e.g. pm_card_visa">
  <button type="submit">Save payment method</button>
</form>
<button id="start-production">Start production</button>
<p id="status"></p>
<form method="post" action="/logout"><button type="submit">Log out</button></form>
<script>{script}</script>"#,
        name = escape(name),
        balance = balance,
        key = escape(publishable_key),
        script = LANDING_SCRIPT,
    ))
}

const LANDING_SCRIPT: &str = r#"
const status = document.getElementById("status");
async function call(path, body) {
  const response = await fetch(path, {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(body),
  });
  const json = await response.json();
  if (!response.ok) throw new Error(json.error);
  return json;
}
document.getElementById("payment").addEventListener("submit", async (event) => {
  event.preventDefault();
  const id = new FormData(event.target).get("payment_method_id");
  try {
    status.textContent = (await call("/api/save-payment-method", { payment_method_id: id })).message;
  } catch (e) {
    status.textContent = e.message;
  }
});
document.getElementById("start-production").addEventListener("click", async () => {
  status.textContent = "Producing...";
  try {
    const payout = await call("/api/start-production", {});
    status.textContent = `Payout ${payout.payout_id} of ${payout.amount.toFixed(2)} EUR is ${payout.status}`;
    document.getElementById("balance").textContent = (0).toFixed(2);
  } catch (e) {
    status.textContent = e.message;
  }
});
"#;

fn layout(body: &str) -> RawHtml<String> {
    RawHtml(format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Production</title></head>\n<body>\n{}\n</body>\n</html>\n",
        body
    ))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_content_is_escaped() {
        let page = landing("<b>mallory</b>", Some(1.5), "pk_test");
        assert!(!page.0.contains("<b>"));
        assert!(page.0.contains("&lt;b&gt;mallory&lt;/b&gt;"));
        assert!(page.0.contains("1.50"));
    }

    #[test]
    fn landing_controls_call_the_api() {
        let page = landing("alice", Some(0.0), "pk_test_1");
        assert!(page.0.contains(r#"data-publishable-key="pk_test_1""#));
        assert!(page.0.contains(r#"fetch(path"#));
        assert!(page.0.contains("/api/save-payment-method"));
        assert!(page.0.contains("/api/start-production"));
    }

    #[test]
    fn missing_balance_is_not_shown_as_zero() {
        let page = landing("alice", None, "pk_test");
        assert!(page.0.contains("unavailable"));
        assert!(!page.0.contains("0.00"));
    }

    #[test]
    fn login_shows_error_only_when_given() {
        assert!(!login(None).0.contains("class=\"error\""));
        assert!(login(Some("invalid credentials"))
            .0
            .contains("invalid credentials"));
    }
}
