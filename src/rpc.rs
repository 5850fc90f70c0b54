//! Typed wrappers around the blog's XML-RPC methods.
//!
//! Servers disagree on types (ids as ints or strings, flags as booleans or
//! ints, dates as `dateTime.iso8601` or strings), so everything read back
//! goes through the lenient accessors at the bottom of this file.

use std::collections::BTreeMap;

use log::debug;
use xmlrpc::{Request, Value};

use crate::error::{Error, Result};
use crate::post::{parse_wire, Category, PostCategory, PostRecord, WireTimestamp};
use crate::transport::ProxyTransport;

/// A blog the account can post to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

/// One row of `mt.getRecentPostTitles`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub post_id: String,
    pub date_created: Option<WireTimestamp>,
    pub title: String,
}

/// A trackback ping received by a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackbackPing {
    pub title: String,
    pub url: String,
    pub ip: String,
}

/// A text filter installed on the server (values for `CONVERT BREAKS`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFilter {
    pub key: String,
    pub label: String,
}

/// Authenticated RPC session against one endpoint.
pub struct BlogClient {
    transport: ProxyTransport,
    username: String,
    password: String,
}

impl BlogClient {
    pub fn new(transport: ProxyTransport, username: &str, password: &str) -> Self {
        BlogClient {
            transport,
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn transport(&self) -> &ProxyTransport {
        &self.transport
    }

    fn credentials(&self) -> [Value; 2] {
        [
            Value::String(self.username.clone()),
            Value::String(self.password.clone()),
        ]
    }

    fn call(&mut self, method: &str, args: Vec<Value>) -> Result<Value> {
        debug!("Calling {} with {} argument(s)", method, args.len());

        let request = args
            .into_iter()
            .fold(Request::new(method), |request, arg| request.arg(arg));

        request.call(&mut self.transport).map_err(|err| {
            self.transport
                .take_error()
                .unwrap_or_else(|| Error::rpc(format!("{} failed: {}", method, err)))
        })
    }

    /// `blogger.getUsersBlogs`
    pub fn get_users_blogs(&mut self) -> Result<Vec<BlogInfo>> {
        let [user, pass] = self.credentials();
        let reply = self.call(
            "blogger.getUsersBlogs",
            vec![Value::String(String::new()), user, pass],
        )?;

        array(&reply)?
            .iter()
            .map(|blog| {
                let blog = members(blog)?;
                Ok(BlogInfo {
                    id: required_text(blog, "blogid")?,
                    name: text_or_empty(blog, "blogName"),
                    url: text_or_empty(blog, "url"),
                })
            })
            .collect()
    }

    /// `mt.getCategoryList`
    pub fn get_category_list(&mut self, blog_id: &str) -> Result<Vec<Category>> {
        let [user, pass] = self.credentials();
        let reply = self.call(
            "mt.getCategoryList",
            vec![Value::String(blog_id.to_string()), user, pass],
        )?;

        array(&reply)?
            .iter()
            .map(|category| {
                let category = members(category)?;
                Ok(Category {
                    id: required_text(category, "categoryId")?,
                    name: text_or_empty(category, "categoryName"),
                })
            })
            .collect()
    }

    /// `metaWeblog.getPost`
    pub fn get_post(&mut self, post_id: &str) -> Result<PostRecord> {
        let [user, pass] = self.credentials();
        let reply = self.call(
            "metaWeblog.getPost",
            vec![Value::String(post_id.to_string()), user, pass],
        )?;
        post_from_value(&reply)
    }

    /// `metaWeblog.getRecentPosts`
    pub fn get_recent_posts(&mut self, blog_id: &str, count: i32) -> Result<Vec<PostRecord>> {
        let [user, pass] = self.credentials();
        let reply = self.call(
            "metaWeblog.getRecentPosts",
            vec![Value::String(blog_id.to_string()), user, pass, Value::Int(count)],
        )?;
        array(&reply)?.iter().map(post_from_value).collect()
    }

    /// `mt.getRecentPostTitles`
    pub fn get_recent_post_titles(&mut self, blog_id: &str, count: i32) -> Result<Vec<PostSummary>> {
        let [user, pass] = self.credentials();
        let reply = self.call(
            "mt.getRecentPostTitles",
            vec![Value::String(blog_id.to_string()), user, pass, Value::Int(count)],
        )?;

        array(&reply)?
            .iter()
            .map(|post| {
                let post = members(post)?;
                Ok(PostSummary {
                    post_id: required_text(post, "postid")?,
                    date_created: post.get("dateCreated").map(timestamp).transpose()?,
                    title: text_or_empty(post, "title"),
                })
            })
            .collect()
    }

    /// `mt.getPostCategories`
    pub fn get_post_categories(&mut self, post_id: &str) -> Result<Vec<PostCategory>> {
        let [user, pass] = self.credentials();
        let reply = self.call(
            "mt.getPostCategories",
            vec![Value::String(post_id.to_string()), user, pass],
        )?;

        array(&reply)?
            .iter()
            .map(|category| {
                let category = members(category)?;
                Ok(PostCategory {
                    name: text_or_empty(category, "categoryName"),
                    primary: category.get("isPrimary").map(flag).unwrap_or(false),
                })
            })
            .collect()
    }

    /// `metaWeblog.newPost`, returning the new post id.
    pub fn new_post(&mut self, blog_id: &str, post: &PostRecord, publish: bool) -> Result<String> {
        let [user, pass] = self.credentials();
        let reply = self.call(
            "metaWeblog.newPost",
            vec![
                Value::String(blog_id.to_string()),
                user,
                pass,
                post_to_value(post),
                Value::Bool(publish),
            ],
        )?;
        text(&reply).ok_or_else(|| Error::rpc("metaWeblog.newPost did not return a post id"))
    }

    /// `metaWeblog.editPost`
    pub fn edit_post(&mut self, post_id: &str, post: &PostRecord, publish: bool) -> Result<()> {
        let [user, pass] = self.credentials();
        self.call(
            "metaWeblog.editPost",
            vec![
                Value::String(post_id.to_string()),
                user,
                pass,
                post_to_value(post),
                Value::Bool(publish),
            ],
        )?;
        Ok(())
    }

    /// `mt.setPostCategories`; the first id becomes the primary category.
    pub fn set_post_categories(&mut self, post_id: &str, category_ids: &[String]) -> Result<()> {
        let [user, pass] = self.credentials();
        let categories = category_ids
            .iter()
            .map(|id| {
                let mut category = BTreeMap::new();
                category.insert("categoryId".to_string(), Value::String(id.clone()));
                Value::Struct(category)
            })
            .collect();

        self.call(
            "mt.setPostCategories",
            vec![
                Value::String(post_id.to_string()),
                user,
                pass,
                Value::Array(categories),
            ],
        )?;
        Ok(())
    }

    /// `mt.publishPost`: rebuild the static files of a post.
    pub fn publish_post(&mut self, post_id: &str) -> Result<()> {
        let [user, pass] = self.credentials();
        self.call(
            "mt.publishPost",
            vec![Value::String(post_id.to_string()), user, pass],
        )?;
        Ok(())
    }

    /// `blogger.deletePost`
    pub fn delete_post(&mut self, post_id: &str, publish: bool) -> Result<()> {
        let [user, pass] = self.credentials();
        self.call(
            "blogger.deletePost",
            vec![
                Value::String(String::new()),
                Value::String(post_id.to_string()),
                user,
                pass,
                Value::Bool(publish),
            ],
        )?;
        Ok(())
    }

    /// `mt.getTrackbackPings`
    pub fn get_trackback_pings(&mut self, post_id: &str) -> Result<Vec<TrackbackPing>> {
        let reply = self.call(
            "mt.getTrackbackPings",
            vec![Value::String(post_id.to_string())],
        )?;

        array(&reply)?
            .iter()
            .map(|ping| {
                let ping = members(ping)?;
                Ok(TrackbackPing {
                    title: text_or_empty(ping, "pingTitle"),
                    url: text_or_empty(ping, "pingURL"),
                    ip: text_or_empty(ping, "pingIP"),
                })
            })
            .collect()
    }

    /// `mt.supportedTextFilters`
    pub fn supported_text_filters(&mut self) -> Result<Vec<TextFilter>> {
        let reply = self.call("mt.supportedTextFilters", Vec::new())?;

        array(&reply)?
            .iter()
            .map(|filter| {
                let filter = members(filter)?;
                Ok(TextFilter {
                    key: text_or_empty(filter, "key"),
                    label: text_or_empty(filter, "label"),
                })
            })
            .collect()
    }

    /// `metaWeblog.newMediaObject`, returning the URL of the stored file.
    pub fn new_media_object(&mut self, blog_id: &str, name: &str, bits: Vec<u8>) -> Result<String> {
        let [user, pass] = self.credentials();
        let mut media = BTreeMap::new();
        media.insert("name".to_string(), Value::String(name.to_string()));
        media.insert("bits".to_string(), Value::Base64(bits));

        let reply = self.call(
            "metaWeblog.newMediaObject",
            vec![
                Value::String(blog_id.to_string()),
                user,
                pass,
                Value::Struct(media),
            ],
        )?;
        required_text(members(&reply)?, "url")
    }
}

/// Encode a post for `metaWeblog.newPost` / `metaWeblog.editPost`.
///
/// Only fields present in the record are sent.
pub fn post_to_value(post: &PostRecord) -> Value {
    let mut map = BTreeMap::new();
    let mut put_text = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            map.insert(key.to_string(), Value::String(value.clone()));
        }
    };

    put_text("title", &post.title);
    put_text("mt_convert_breaks", &post.convert_breaks);
    put_text("mt_keywords", &post.keywords);
    put_text("postid", &post.post_id);
    put_text("description", &post.description);
    put_text("mt_text_more", &post.text_more);
    put_text("mt_excerpt", &post.excerpt);

    if let Some(date) = &post.date_created {
        map.insert("dateCreated".to_string(), timestamp_to_value(date));
    }
    if let Some(allow) = post.allow_comments {
        map.insert("mt_allow_comments".to_string(), Value::Int(i32::from(allow)));
    }
    if let Some(allow) = post.allow_pings {
        map.insert("mt_allow_pings".to_string(), Value::Int(allow));
    }
    if !post.ping_urls.is_empty() {
        let urls = post
            .ping_urls
            .iter()
            .map(|url| Value::String(url.clone()))
            .collect();
        map.insert("mt_tb_ping_urls".to_string(), Value::Array(urls));
    }

    Value::Struct(map)
}

/// Decode a post returned by `metaWeblog.getPost` or `getRecentPosts`.
pub fn post_from_value(value: &Value) -> Result<PostRecord> {
    let post = members(value)?;
    let text_field = |key: &str| post.get(key).and_then(text);

    let allow_comments = match post.get("mt_allow_comments").and_then(integer) {
        Some(allow) => Some(
            u8::try_from(allow)
                .ok()
                .filter(|allow| *allow <= 2)
                .ok_or_else(|| Error::rpc(format!("Unexpected mt_allow_comments value {}", allow)))?,
        ),
        None => None,
    };

    let ping_urls = match post.get("mt_tb_ping_urls") {
        Some(Value::Array(urls)) => urls.iter().filter_map(text).collect(),
        Some(other) => text(other).into_iter().collect(),
        None => Vec::new(),
    };

    Ok(PostRecord {
        title: text_field("title"),
        date_created: post.get("dateCreated").map(timestamp).transpose()?,
        allow_comments,
        allow_pings: post.get("mt_allow_pings").and_then(integer),
        convert_breaks: text_field("mt_convert_breaks"),
        keywords: text_field("mt_keywords"),
        ping_urls,
        post_id: text_field("postid"),
        description: text_field("description"),
        text_more: text_field("mt_text_more"),
        excerpt: text_field("mt_excerpt"),
    })
}

fn timestamp_to_value(ts: &WireTimestamp) -> Value {
    Value::DateTime(iso8601::DateTime {
        date: iso8601::Date::YMD {
            year: ts.year(),
            month: ts.month(),
            day: ts.day(),
        },
        time: iso8601::Time {
            hour: ts.hour(),
            minute: ts.minute(),
            second: ts.second(),
            millisecond: 0,
            tz_offset_hours: 0,
            tz_offset_minutes: 0,
        },
    })
}

fn timestamp(value: &Value) -> Result<WireTimestamp> {
    match value {
        Value::DateTime(date_time) => match date_time.date {
            iso8601::Date::YMD { year, month, day } => WireTimestamp::from_parts(
                year,
                month,
                day,
                date_time.time.hour,
                date_time.time.minute,
                date_time.time.second,
            ),
            _ => Err(Error::format(format!(
                "\"{:?}\" is not a calendar date",
                date_time.date
            ))),
        },
        Value::String(raw) => parse_wire(raw),
        other => Err(Error::rpc(format!("Expected a date, got {:?}", other))),
    }
}

fn members(value: &Value) -> Result<&BTreeMap<String, Value>> {
    match value {
        Value::Struct(map) => Ok(map),
        other => Err(Error::rpc(format!("Expected a struct, got {:?}", other))),
    }
}

fn array(value: &Value) -> Result<&[Value]> {
    match value {
        Value::Array(items) => Ok(items.as_slice()),
        other => Err(Error::rpc(format!("Expected an array, got {:?}", other))),
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Int64(i) => Some(i.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

fn integer(value: &Value) -> Option<i32> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Int64(i) => i32::try_from(*i).ok(),
        Value::Bool(b) => Some(i32::from(*b)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim(), "1" | "true"),
        other => integer(other).map(|i| i != 0).unwrap_or(false),
    }
}

fn required_text(map: &BTreeMap<String, Value>, key: &str) -> Result<String> {
    map.get(key)
        .and_then(text)
        .ok_or_else(|| Error::rpc(format!("Response is missing \"{}\"", key)))
}

fn text_or_empty(map: &BTreeMap<String, Value>, key: &str) -> String {
    map.get(key).and_then(text).unwrap_or_default()
}
