//! HTML for the admin panel.
//!
//! Pages are small enough to build with `format!`. Nothing user-supplied is
//! echoed back; card UIDs and numbers are the only dynamic content.

use smartlock_core::CardUid;
use smartlock_storage::LockSettings;

pub const LOGIN_FORM: &str = "<html><body><form action='/login'>Password: \
<input type='password' name='PASS'><input type='submit' value='Login'></form></body></html>";

const STYLE: &str = "body{font-family:sans-serif;margin:2em}\
table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:4px 8px}\
.bar{width:200px;background:#eee}.fill{background:#c33;height:12px}";

/// The authenticated admin panel.
pub fn panel(settings: &LockSettings, cards: &[CardUid]) -> String {
    let rows: String = cards
        .iter()
        .enumerate()
        .map(|(index, uid)| {
            format!(
                "<tr><td>{index}</td><td>{uid}</td>\
<td><a href='/delete?ID={uid}'>Delete</a></td></tr>"
            )
        })
        .collect();

    let usage = settings.memory_usage_percent;
    let features = [
        ("toggleNFC", "Cards (NFC)", settings.nfc_enabled),
        ("togglePIN", "PIN code", settings.pin_enabled),
        ("toggleScanner", "Barcode scanner", settings.scanner_enabled),
    ]
    .iter()
    .map(|(route, label, enabled)| {
        let state = if *enabled { "on" } else { "off" };
        format!("<li>{label}: <b>{state}</b> <a href='/{route}'>toggle</a></li>")
    })
    .collect::<String>();

    format!(
        "<html><head><title>Smart lock</title><style>{STYLE}</style></head><body>\
<h1>Smart lock</h1><p><a href='/login?LOGOUT'>Logout</a></p>\
<h2>Cards</h2><table><tr><th>#</th><th>UID</th><th></th></tr>{rows}</table>\
<p>Memory usage: {usage}% ({count}/{capacity})</p>\
<div class='bar'><div class='fill' style='width:{usage}%'></div></div>\
<h2>Inputs</h2><ul>{features}</ul>\
<h2>Settings</h2>\
<form action='/changeLockTime'>Lock time (minutes): \
<input name='LOCKTIME' value='{lock_time}' maxlength='3'><input type='submit' value='Save'></form>\
<form action='/changePin'>PIN: <input type='password' name='PIN' maxlength='8'>\
<input type='submit' value='Save'></form>\
<form action='/changePass'>Admin password: <input type='password' name='PASS' maxlength='8'>\
<input type='submit' value='Save'></form>\
</body></html>",
        count = settings.card_count,
        capacity = settings.capacity,
        lock_time = settings.lock_time_minutes,
    )
}
