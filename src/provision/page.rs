//! Portal page rendering.
//!
//! A pure function from the masked [`PortalView`] to an HTML document.
//! The document carries the current form state pre-filled, so the
//! operator sees what the device holds - with the secret always masked.

use super::PortalView;

/// Render the provisioning portal for the given view state.
pub fn render_portal(view: &PortalView) -> String {
    let notice = match view.notice {
        Some(msg) => format!(r#"<p class="notice">{msg}</p>"#),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>
html {{ font-family: Helvetica; display: inline-block; margin: 0px auto; text-align: center; }}
.notice {{ color: #b00; }}
</style>
</head>
<body>
<h1>FieldCam setup</h1>
<p>Firmware v{version}</p>
<p>Current network: {name}</p>
{notice}<hr/>
<form action="/" method="post">
<label for="ssid">Network:</label>
<input type="text" id="ssid" name="ssid" value="{name}"><br><br>
<label for="psk">Secret:</label>
<input type="password" id="psk" name="psk" value="{secret}"><br><br>
<input type="submit" value="Submit">
</form>
<hr/>
<form action="/connect">
<input type="submit" value="Connect"/>
</form>
</body>
</html>
"#,
        version = view.version_label,
        name = view.network_name.as_str(),
        secret = view.masked_secret,
        notice = notice,
    )
}
