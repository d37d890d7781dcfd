use gloo_net::http::Request;

use crate::utils::format::escape_html;

/// Bloque que sustituye al contenido cuando la plantilla no carga
pub fn content_load_error_html(title: &str, url: &str, reason: &str) -> String {
    format!(
        r#"<div class="p-6 text-center"><h2 class="text-xl font-semibold text-red-600 dark:text-red-400">Content Load Error</h2><p class="mt-2 text-gray-600 dark:text-gray-300">Could not load the content for <strong>{}</strong> ({}).</p><p class="mt-1 text-sm text-gray-500">{}</p></div>"#,
        escape_html(title),
        escape_html(url),
        escape_html(reason),
    )
}

/// Fetch the HTML template of a module (`pages/...html`)
pub async fn fetch_template(content_url: &str) -> Result<String, String> {
    log::info!("📄 [TEMPLATE] Cargando {}", content_url);
    let response = Request::get(content_url)
        .send()
        .await
        .map_err(|e| format!("Request error: {}", e))?;

    if !response.ok() {
        return Err(format!("HTTP error: {} {}", response.status(), response.status_text()));
    }

    response.text().await.map_err(|e| format!("Read error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_block_escapes_its_inputs() {
        let html = content_load_error_html("<Vehicles>", "pages/x.html", "HTTP error: 404 Not Found");
        assert!(html.contains("Content Load Error"));
        assert!(html.contains("&lt;Vehicles&gt;"));
        assert!(html.contains("404 Not Found"));
    }
}
