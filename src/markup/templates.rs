//! HTML fragments and static assets for the routes page.

/// Page skeleton with the placeholders `{title}`, `{css}`, `{favicon.ico}`,
/// `{intro}` and `{routes}`.
pub fn base_template() -> &'static str {
    r#"
    <html>
      <head>
        <title>{title}</title>
        <style>{css}</style>
        <link rel="icon" type="image/png" href="{favicon.ico}" />
      </head>
      <body>
        <h1>{title}</h1>
        <div>
          {intro}
        </div>
        <div>
          {routes}
        </div>
      </body>
    </html>
  "#
}

pub fn unordered_list(list_items: &str) -> String {
    format!("\n    <ul>\n      {}\n    </ul>\n  ", list_items)
}

pub fn ordered_list(list_items: &str) -> String {
    format!("\n    <ol>\n      {}\n    </ol>\n  ", list_items)
}

pub fn list_item(text: &str) -> String {
    format!("<li>{}</li>", text)
}

pub fn div(text: &str) -> String {
    format!("<div>{}</div>", text)
}

pub fn p(text: &str) -> String {
    format!("<p>{}</p>", text)
}

/// Heading of the given level, clamped to `h1`..=`h6`. Blank text yields
/// no heading at all.
pub fn head(level: i32, text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let level = level.clamp(1, 6);
    format!("<h{level}>{text}</h{level}>")
}

/// Default stylesheet.
pub fn milligram_min_css() -> &'static str {
    "*,*:after,*:before{box-sizing:inherit}\
html{box-sizing:border-box;font-size:62.5%}\
body{color:#606c76;font-family:'Roboto','Helvetica Neue','Helvetica','Arial',sans-serif;font-size:1.6em;font-weight:300;letter-spacing:.01em;line-height:1.6;margin:0 auto;max-width:112rem;padding:0 2rem}\
a{color:#9b4dca;text-decoration:none}a:focus,a:hover{color:#606c76}\
code{background:#f4f5f6;border-radius:.4rem;font-size:86%;margin:0 .2rem;padding:.2rem .5rem;white-space:nowrap}\
details{border-bottom:.1rem solid #e1e1e1;padding:1rem 0}\
summary{cursor:pointer;font-family:monospace;font-size:1.8rem;font-weight:700}\
h1,h2,h3,h4,h5,h6{font-weight:300;letter-spacing:-.1rem;margin-bottom:2rem;margin-top:0}\
h1{font-size:4.6rem;line-height:1.2}h2{font-size:3.6rem;line-height:1.25}h3{font-size:2.8rem;line-height:1.3}\
h4{font-size:2.2rem;line-height:1.35}h5{font-size:1.8rem;line-height:1.5}h6{font-size:1.6rem;line-height:1.4}\
ul,ol{list-style:none;margin-top:0;padding-left:0}ul ul,ol ol,ul ol,ol ul{font-size:90%;margin:1.5rem 0 1.5rem 3rem}\
ul{list-style:circle inside}ol{list-style:decimal inside}li{margin-bottom:1rem}\
p{margin-top:0}div{margin-bottom:1rem}"
}

/// Alternative, denser stylesheet.
pub fn bass_css() -> &'static str {
    "*{box-sizing:border-box}\
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,'Helvetica Neue',Helvetica,sans-serif;line-height:1.5;margin:0;padding:0 1rem;color:#111;background-color:#fff}\
a{color:#07c}h1,h2,h3,h4,h5,h6{font-weight:600;line-height:1.25;margin-top:1em;margin-bottom:.5em}\
h1{font-size:2rem}h2{font-size:1.5rem}h3{font-size:1.25rem}h4{font-size:1rem}h5{font-size:.875rem}h6{font-size:.75rem}\
code,pre,summary{font-family:'SF Mono',Menlo,Consolas,monospace}\
details{padding:.5rem 0;border-bottom:1px solid #eee}summary{cursor:pointer;font-weight:600}\
ul,ol{padding-left:2rem}li{margin-bottom:.25rem}"
}

/// 16x16 PNG icon as a data URI.
pub fn favicon_ico_data() -> &'static str {
    "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAABAAAAAQCAYAAAAf8/9hAAAAIklEQVR42mNQUFD4TwlmGDWAigbM9j1FEh6OBoymgwE0AACwqJ5wZEGNNAAAAABJRU5ErkJggg=="
}
