use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use pantry::{Credential, Identity, InventoryItem, ItemView, Removal, SearchOutcome, Session};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, stdin, stdout};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:1111")]
    url: String,
}

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Signup {
        first_name: String,
        email: String,
        password: String,
    },
    Signin {
        email: String,
        password: String,
    },
    Signout,
    DeleteAccount,
    Whoami,
    List,
    Add {
        #[arg(required = true)]
        name: Vec<String>,
    },
    Remove {
        #[arg(required = true)]
        name: Vec<String>,
    },
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Drop the search result and show the list again
    Close,
    Quit,
}

#[derive(Deserialize)]
struct AddResponse {
    name: String,
    quantity: u32,
    inventory: Vec<InventoryItem>,
}

#[derive(Deserialize)]
struct RemoveResponse {
    name: String,
    removal: Removal,
    inventory: Vec<InventoryItem>,
}

struct Shell {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
    session: Session,
    view: ItemView,
    inventory: Vec<InventoryItem>,
}

impl Shell {
    fn new(base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.trim_end_matches('/').to_string(),
            token: None,
            session: Session::anonymous(),
            view: ItemView::default(),
            inventory: Vec::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        debug!("{} {}", response.status(), response.url());

        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            Ok(response)
        } else {
            Err(anyhow!(response.text().await?))
        }
    }

    async fn run(&mut self, command: Command, lines: &mut Lines<BufReader<Stdin>>) -> Result<()> {
        match command {
            Command::Signup {
                first_name,
                email,
                password,
            } => {
                let response = self
                    .send(self.http.post(self.url("/auth/signup")).json(&json!({
                        "firstName": first_name,
                        "email": email,
                        "password": password,
                    })))
                    .await?;
                println!("{}", response.text().await?);
            }
            Command::Signin { email, password } => {
                let credential: Credential = self
                    .send(
                        self.http
                            .post(self.url("/auth/signin"))
                            .json(&json!({ "email": email, "password": password })),
                    )
                    .await?
                    .json()
                    .await?;

                self.token = Some(credential.token);
                self.session.sign_in(credential.identity);
                self.refresh().await?;
            }
            Command::Signout => {
                self.send(self.http.post(self.url("/auth/signout"))).await?;
                self.token = None;
                self.session.sign_out();
            }
            Command::DeleteAccount => {
                if !confirm(lines, "Are you sure you want to delete your account?").await? {
                    return Ok(());
                }

                self.send(self.http.delete(self.url("/auth/account")))
                    .await?;
                self.token = None;
                self.session.sign_out();
            }
            Command::Whoami => {
                let identity: Option<Identity> = self
                    .send(self.http.get(self.url("/auth/me")))
                    .await?
                    .json()
                    .await?;

                match identity {
                    Some(identity) => println!("{} ({})", identity.email, identity.uid),
                    None => println!("Not signed in"),
                }
            }
            Command::List => {
                self.refresh().await?;
            }
            Command::Add { name } => {
                let added: AddResponse = self
                    .send(
                        self.http
                            .post(self.url("/inventory/add"))
                            .json(&json!({ "name": name.join(" ") })),
                    )
                    .await?
                    .json()
                    .await?;

                self.view.apply_add(&added.name, added.quantity);
                self.inventory = added.inventory;
                self.render();
            }
            Command::Remove { name } => {
                let removed: RemoveResponse = self
                    .send(
                        self.http
                            .post(self.url("/inventory/remove"))
                            .json(&json!({ "name": name.join(" ") })),
                    )
                    .await?
                    .json()
                    .await?;

                self.view.apply_remove(&removed.name, &removed.removal);
                self.inventory = removed.inventory;
                self.render();
            }
            Command::Search { query } => {
                self.search(&query.join(" "), lines).await?;
            }
            Command::Close => {
                self.view.discard();
                self.render();
            }
            Command::Quit => {}
        }

        Ok(())
    }

    async fn search(&mut self, query: &str, lines: &mut Lines<BufReader<Stdin>>) -> Result<()> {
        let response = self
            .send(
                self.http
                    .get(self.url("/inventory/search"))
                    .query(&[("q", query)]),
            )
            .await?;

        let outcome: SearchOutcome = if response.status() == StatusCode::NOT_FOUND {
            let prompt = format!(
                "Item: {query} is not available. Would you like to add it to the inventory?"
            );
            let create = if confirm(lines, &prompt).await? {
                "true"
            } else {
                "false"
            };

            self.send(
                self.http
                    .get(self.url("/inventory/search"))
                    .query(&[("q", query), ("create", create)]),
            )
            .await?
            .json()
            .await?
        } else {
            response.json().await?
        };

        if let SearchOutcome::Created(created) = &outcome {
            println!(
                "{} has been added to the inventory with quantity: {}",
                created.name, created.quantity
            );
            self.refresh_inventory().await?;
        }

        self.view.apply_search(&outcome);
        self.render();

        Ok(())
    }

    async fn refresh_inventory(&mut self) -> Result<()> {
        self.inventory = self
            .send(self.http.get(self.url("/inventory")))
            .await?
            .json()
            .await?;

        Ok(())
    }

    async fn refresh(&mut self) -> Result<()> {
        self.refresh_inventory().await?;
        self.render();

        Ok(())
    }

    fn render(&self) {
        match &self.view {
            ItemView::List if self.inventory.is_empty() => println!("(pantry is empty)"),
            ItemView::List => {
                for item in &self.inventory {
                    println!("{:<24} {}", item.name, item.quantity);
                }
            }
            ItemView::SearchResult(Some(result)) => {
                println!("{:<24} {}", result.name, result.quantity);
            }
            ItemView::SearchResult(None) => println!("(no search result)"),
        }
    }
}

async fn confirm(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Result<bool> {
    let mut out = stdout();
    out.write_all(format!("{prompt} [y/N] ").as_bytes()).await?;
    out.flush().await?;

    let answer = lines.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn watch_session(session: &Session) {
    let mut changes = session.subscribe();

    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let current = changes.borrow_and_update().clone();
            match current {
                Some(identity) => println!("Signed in as {}", identity.email),
                None => println!("Signed out"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let mut shell = Shell::new(args.url);
    watch_session(&shell.session);

    if let Err(e) = shell.refresh().await {
        println!("{e}");
    }

    let mut lines = BufReader::new(stdin()).lines();
    let mut out = stdout();

    loop {
        out.write_all(b"pantry> ").await?;
        out.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }

        let command = match Line::try_parse_from(words) {
            Ok(line) => line.command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        if matches!(command, Command::Quit) {
            break;
        }

        if let Err(e) = shell.run(command, &mut lines).await {
            println!("{e}");
        }
    }

    Ok(())
}
