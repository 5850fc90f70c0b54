//! One handler per subcommand.
//!
//! Handlers read documents from an injected reader and print results to an
//! injected writer; progress goes to the log.

use std::io::{BufRead, Read, Write};

use log::info;

use crate::args::Command;
use crate::config::Profile;
use crate::error::{Error, Result};
use crate::http::{ProxyConfig, TargetUrl};
use crate::post::{self, reconcile, Category, PostDocument};
use crate::rpc::{BlogClient, BlogInfo, PostSummary, TextFilter, TrackbackPing};
use crate::table::render_table;
use crate::transport::ProxyTransport;

/// An authenticated client plus the blog the commands act on.
pub struct Session {
    client: BlogClient,
    blog_id: Option<String>,
}

impl Session {
    pub fn new(client: BlogClient, blog_id: Option<String>) -> Self {
        Session { client, blog_id }
    }

    /// Build a session from resolved settings.
    ///
    /// # Arguments
    ///
    /// * `profile` - Settings for the selected blog or site.
    /// * `proxy` - Raw proxy specification, if any.
    pub fn connect(profile: &Profile<'_>, proxy: Option<&str>) -> Result<Self> {
        let url = TargetUrl::parse(&profile.url()?)?;
        let proxy = proxy.map(ProxyConfig::parse).transpose()?;
        if let Some(proxy) = &proxy {
            info!("Using proxy {}:{}", proxy.host, proxy.port);
        }

        let transport = ProxyTransport::new(url, proxy)?;
        let client = BlogClient::new(transport, &profile.username()?, &profile.password()?);
        Ok(Session::new(client, profile.get("blogid")))
    }

    fn blog_id(&self) -> Result<String> {
        self.blog_id
            .clone()
            .ok_or_else(|| Error::Config("Setting \"blogid\" is missing".to_string()))
    }

    /// Run one command.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        command: &Command,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        match command {
            Command::Blogs { .. } => self.blogs(output),
            Command::Categories => self.categories(output),
            Command::Edit { post_id } => self.edit(post_id, input),
            Command::Get { post_id } => self.get(post_id, output),
            Command::List { count } => self.list(*count, output),
            Command::New => self.new_post(input, output),
            Command::Pings { post_id } => self.pings(post_id, output),
            Command::Rebuild { post_id } => self.rebuild(post_id),
            Command::Filters => self.filters(output),
            Command::Upload { filename } => self.upload(filename, input, output),
            Command::Delete { post_id } => self.delete(post_id),
        }
    }

    fn blogs<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let blogs = self.client.get_users_blogs()?;
        output.write_all(render_table(&blog_rows(&blogs), true).as_bytes())?;
        Ok(())
    }

    fn categories<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let blog_id = self.blog_id()?;
        let categories = self.client.get_category_list(&blog_id)?;
        output.write_all(render_table(&category_rows(&categories), true).as_bytes())?;
        Ok(())
    }

    fn edit<R: BufRead>(&mut self, requested: &str, input: &mut R) -> Result<()> {
        info!("Parsing post entry from standard input...");
        let document = post::decode(input)?;
        let post_id = edit_target(requested, &document)?;

        info!("Saving post entry \"{}\"...", post_id);
        self.client
            .edit_post(&post_id, &document.post, document.publish)?;

        self.assign_categories(&post_id, &document.categories)
    }

    fn get<W: Write>(&mut self, requested: &str, output: &mut W) -> Result<()> {
        let entry = if requested == "-" {
            info!("Retrieve most recent post entry...");
            let blog_id = self.blog_id()?;
            self.client
                .get_recent_posts(&blog_id, 1)?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    Error::Usage("The current blog does not have any entry.".to_string())
                })?
        } else {
            info!("Retrieve post entry \"{}\"...", requested);
            self.client.get_post(requested)?
        };

        let post_id = match (&entry.post_id, requested) {
            (Some(post_id), _) => post_id.clone(),
            (None, "-") => return Err(Error::rpc("Post entry is missing \"postid\"")),
            (None, requested) => requested.to_string(),
        };

        info!("Retrieve categories for post entry \"{}\"...", post_id);
        let categories = self.client.get_post_categories(&post_id)?;

        output.write_all(post::encode(&entry, &categories).as_bytes())?;
        Ok(())
    }

    fn list<W: Write>(&mut self, count: i32, output: &mut W) -> Result<()> {
        let blog_id = self.blog_id()?;
        info!("Retrieve \"{}\" recent posts...", count);
        let posts = self.client.get_recent_post_titles(&blog_id, count)?;
        output.write_all(render_table(&post_rows(&posts), true).as_bytes())?;
        Ok(())
    }

    fn new_post<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<()> {
        info!("Parsing post entry from standard input...");
        let document = post::decode(input)?;
        let blog_id = self.blog_id()?;

        info!("Saving new post entry...");
        let post_id = self
            .client
            .new_post(&blog_id, &document.post, document.publish)?;

        self.assign_categories(&post_id, &document.categories)?;

        writeln!(output, "{}", post_id)?;
        Ok(())
    }

    fn pings<W: Write>(&mut self, post_id: &str, output: &mut W) -> Result<()> {
        let pings = self.client.get_trackback_pings(post_id)?;
        output.write_all(render_table(&ping_rows(&pings), true).as_bytes())?;
        Ok(())
    }

    fn rebuild(&mut self, post_id: &str) -> Result<()> {
        info!("Rebuilding post entry \"{}\"...", post_id);
        self.client.publish_post(post_id)
    }

    fn filters<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let filters = self.client.supported_text_filters()?;
        output.write_all(render_table(&filter_rows(&filters), true).as_bytes())?;
        Ok(())
    }

    fn upload<R: BufRead, W: Write>(
        &mut self,
        filename: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<()> {
        let blog_id = self.blog_id()?;
        let mut bits = Vec::new();
        input.read_to_end(&mut bits)?;

        info!("Uploading \"{}\" ({} bytes)...", filename, bits.len());
        let url = self.client.new_media_object(&blog_id, filename, bits)?;

        writeln!(output, "{}", url)?;
        Ok(())
    }

    fn delete(&mut self, post_id: &str) -> Result<()> {
        info!("Deleting post entry \"{}\"...", post_id);
        self.client.delete_post(post_id, true)
    }

    /// Attach the document's categories to a post.
    ///
    /// Nothing is sent when the document names no categories, or none of
    /// them exist on the server.
    fn assign_categories(&mut self, post_id: &str, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let blog_id = self.blog_id()?;
        info!("Retrieve available categories...");
        let available = self.client.get_category_list(&blog_id)?;

        let ids = reconcile(names, &available);
        if ids.is_empty() {
            return Ok(());
        }

        info!(
            "Add categories \"{}\" to post entry \"{}\"...",
            ids.join(","),
            post_id
        );
        self.client.set_post_categories(post_id, &ids)
    }
}

/// Work out which post `edit` should update.
///
/// `-` takes the id from the document; an explicit id must agree with the
/// document's POSTID when it has one.
fn edit_target(requested: &str, document: &PostDocument) -> Result<String> {
    let in_document = document.post.post_id.as_deref();

    match (requested, in_document) {
        ("-", Some(post_id)) => Ok(post_id.to_string()),
        ("-", None) => Err(Error::Usage(
            "Cannot discover post ID from the input.".to_string(),
        )),
        (requested, Some(post_id)) if post_id != requested => Err(Error::Usage(format!(
            "Post ID does not match. ID in the input is \"{}\"",
            post_id
        ))),
        (requested, _) => Ok(requested.to_string()),
    }
}

fn row<const N: usize>(cells: [&str; N]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

fn blog_rows(blogs: &[BlogInfo]) -> Vec<Vec<String>> {
    std::iter::once(row(["ID", "Blog Name", "URL"]))
        .chain(blogs.iter().map(|b| row([b.id.as_str(), b.name.as_str(), b.url.as_str()])))
        .collect()
}

fn category_rows(categories: &[Category]) -> Vec<Vec<String>> {
    let mut sorted: Vec<&Category> = categories.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    std::iter::once(row(["ID", "Category Name"]))
        .chain(sorted.into_iter().map(|c| row([c.id.as_str(), c.name.as_str()])))
        .collect()
}

fn post_rows(posts: &[PostSummary]) -> Vec<Vec<String>> {
    std::iter::once(row(["ID", "Date", "Title"]))
        .chain(posts.iter().map(|p| {
            let date = p
                .date_created
                .as_ref()
                .map(|d| d.to_listing())
                .unwrap_or_default();
            row([p.post_id.as_str(), date.as_str(), p.title.as_str()])
        }))
        .collect()
}

fn ping_rows(pings: &[TrackbackPing]) -> Vec<Vec<String>> {
    std::iter::once(row(["Title", "URL", "IP"]))
        .chain(pings.iter().map(|p| row([p.title.as_str(), p.url.as_str(), p.ip.as_str()])))
        .collect()
}

fn filter_rows(filters: &[TextFilter]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = filters
        .iter()
        .map(|f| row([f.key.as_str(), f.label.as_str()]))
        .collect();
    rows.sort();
    rows.insert(0, row(["Key", "Label"]));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::post::parse_wire;

    fn document(text: &str) -> PostDocument {
        post::decode(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_edit_target() {
        let with_id = document("TITLE: x\nPOSTID: 42\n");
        let without_id = document("TITLE: x\n");

        assert_eq!(edit_target("-", &with_id).unwrap(), "42");
        assert_eq!(edit_target("42", &with_id).unwrap(), "42");
        assert_eq!(edit_target("7", &without_id).unwrap(), "7");

        let err = edit_target("-", &without_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);

        let err = edit_target("7", &with_id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(
            err.to_string(),
            "Post ID does not match. ID in the input is \"42\""
        );
    }

    #[test]
    fn test_category_rows_sorted_by_name() {
        let categories = vec![
            Category {
                id: "2".to_string(),
                name: "Tech".to_string(),
            },
            Category {
                id: "1".to_string(),
                name: "News".to_string(),
            },
        ];
        let rows = category_rows(&categories);
        assert_eq!(rows[0], row(["ID", "Category Name"]));
        assert_eq!(rows[1], row(["1", "News"]));
        assert_eq!(rows[2], row(["2", "Tech"]));
    }

    #[test]
    fn test_filter_rows_sorted() {
        let filters = vec![
            TextFilter {
                key: "markdown".to_string(),
                label: "Markdown".to_string(),
            },
            TextFilter {
                key: "__default__".to_string(),
                label: "Convert Line Breaks".to_string(),
            },
        ];
        let rows = filter_rows(&filters);
        assert_eq!(rows[0], row(["Key", "Label"]));
        assert_eq!(rows[1][0], "__default__");
        assert_eq!(rows[2][0], "markdown");
    }

    #[test]
    fn test_post_rows_dates() {
        let posts = vec![
            PostSummary {
                post_id: "3".to_string(),
                date_created: Some(parse_wire("20051119T08:30:00").unwrap()),
                title: "Hello".to_string(),
            },
            PostSummary {
                post_id: "2".to_string(),
                date_created: None,
                title: "Undated".to_string(),
            },
        ];
        let rows = post_rows(&posts);
        assert_eq!(rows[1], row(["3", "2005-11-19 08:30:00", "Hello"]));
        assert_eq!(rows[2], row(["2", "", "Undated"]));
    }
}
